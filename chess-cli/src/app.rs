//! 命令行对局
//!
//! 先用开局文件构建局面；离线模式打印结果，联机模式从标准输入读取 `e2 e4` 形式的命令。

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use chess_core::{MoveHandler, Side};
use chess_io::{
    await_greeting, connect, greet_guest, ChessReader, Command, GameLoad, Host, Session,
    SessionEnd, SessionEvent, TcpConnection,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{Args, Mode};
use crate::config::AppConfig;

/// 命令队列长度
const COMMAND_CAPACITY: usize = 8;

/// 通知队列长度
const EVENT_CAPACITY: usize = 32;

/// 按参数运行
pub async fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let load = replay(&args.file)?;

    match args.mode() {
        Mode::Offline => {
            println!("{}", summary(&load.handler));
            Ok(())
        }
        Mode::Host => {
            let host = Host::bind(&config.listen_config())
                .await
                .context("无法监听端口")?;
            info!(addr = ?host.local_addr(), "waiting for an opponent");
            let mut conn = host.accept(config.network.accept_timeout()).await?;
            let local = greet_guest(&mut conn).await?;
            play(load.handler, local, conn).await
        }
        Mode::Join => {
            let mut conn = connect(&config.network)
                .await
                .with_context(|| format!("无法连接到 {}", config.network.addr()))?;
            let local = await_greeting(&mut conn).await?;
            play(load.handler, local, conn).await
        }
    }
}

/// 读取开局文件
pub fn replay(path: &Path) -> Result<GameLoad> {
    let reader =
        ChessReader::open(path).with_context(|| format!("无法打开开局文件: {:?}", path))?;
    let load = reader.read_game()?;
    for skipped in &load.skipped {
        eprintln!("{}", skipped);
    }
    Ok(load)
}

/// 棋盘、走子方和对局状态
pub fn summary(handler: &MoveHandler) -> String {
    format!(
        "{}\nTurn: {}\nState: {}",
        handler.board(),
        handler.turn(),
        handler.state()
    )
}

/// 一条通知的文本
pub fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Moved {
            by,
            mv,
            board,
            state,
        } => format!("{} played {}\n{}\nState: {}", by, mv, board, state),
        SessionEvent::Rejected { by, reason } => format!("{} move rejected: {}", by, reason),
    }
}

async fn play(handler: MoveHandler, local: Side, conn: TcpConnection) -> Result<()> {
    let mut session = Session::start(handler, local, conn);
    println!("You play {}.\n{}", local, summary(session.handler()));

    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (event_tx, mut events) = mpsc::channel(EVENT_CAPACITY);

    // 标准输入是阻塞读取，放在独立线程
    std::thread::spawn(move || read_commands(std::io::stdin().lock(), cmd_tx));
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", describe(&event));
        }
    });

    let end = session.run(cmd_rx, event_tx).await?;
    printer.await?;

    match end {
        SessionEnd::GameOver(state) => println!("Game over: {}", state),
        SessionEnd::Quit => println!("You left the game."),
        SessionEnd::PeerClosed => println!("Your opponent left the game."),
    }
    Ok(())
}

/// 逐行解析命令，`quit` 或输入结束时停止
fn read_commands(input: impl BufRead, tx: mpsc::Sender<Command>) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(command) => {
                if tx.blocking_send(command).is_err() || command == Command::Quit {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}
