//! 터미널 입력/안내.
//!
//! `DecisionPrompt` 포트 구현과 콘솔 명령 파싱.
//! 안내는 바로 출력하고, 응답은 stdin 줄 입력으로 러너 명령 채널에 들어온다.

use async_trait::async_trait;
use hubwatch_core::error::CoreError;
use hubwatch_core::ports::prompt::{DecisionNotice, DecisionPrompt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::runner::RunnerCommand;

/// 콘솔 입력 해석 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(RunnerCommand),
    Quit,
}

/// 한 줄 입력 해석
///
/// - `y` / `n` — 미완료 작업 안내 응답
/// - 빈 줄 — 사용자 활동 (알람 중지)
/// - `start` / `stop` / `resync` / `stats` — 모니터링 제어
/// - `q` / `quit` — 종료
pub fn parse_console_line(line: &str) -> Option<ConsoleInput> {
    let command = match line.trim().to_lowercase().as_str() {
        "" => RunnerCommand::UserActivity,
        "y" | "yes" | "예" => RunnerCommand::Decision(true),
        "n" | "no" | "아니오" => RunnerCommand::Decision(false),
        "start" => RunnerCommand::Start,
        "stop" => RunnerCommand::Stop,
        "resync" => RunnerCommand::Resync,
        "stats" => RunnerCommand::Stats,
        "q" | "quit" | "exit" => return Some(ConsoleInput::Quit),
        _ => return None,
    };
    Some(ConsoleInput::Command(command))
}

/// 터미널 안내 출력
pub struct ConsolePrompt;

#[async_trait]
impl DecisionPrompt for ConsolePrompt {
    async fn present(&self, notice: &DecisionNotice) -> Result<(), CoreError> {
        let mut stdout = std::io::stdout();
        writeln!(stdout)?;
        writeln!(stdout, "⚠️  {}", notice.title)?;
        writeln!(stdout, "   {}", notice.message)?;
        writeln!(stdout, "   [y] 계속  [n] 모니터링 끄기")?;
        stdout.flush()?;
        Ok(())
    }
}

/// stdin 줄 입력을 읽어 러너 명령으로 보낸다. `Quit`이나 EOF에서 반환.
///
/// 반환값이 true면 사용자가 종료를 요청한 것.
pub async fn read_console(commands: mpsc::Sender<RunnerCommand>) -> bool {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin 종료");
                return false;
            }
            Err(e) => {
                debug!("stdin 읽기 실패: {e}");
                return false;
            }
        };
        match parse_console_line(&line) {
            Some(ConsoleInput::Command(command)) => {
                if commands.send(command).await.is_err() {
                    return false;
                }
            }
            Some(ConsoleInput::Quit) => {
                info!("사용자 종료 요청");
                return true;
            }
            None => {
                println!("알 수 없는 입력: {line} (y, n, start, stop, resync, stats, q)");
            }
        }
    }
}
