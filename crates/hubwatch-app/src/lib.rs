//! # hubwatch-app
//!
//! 실행 파일 조립부. 어댑터를 묶어 제어기를 만들고, 러너 태스크가 타이머/설정/콘솔 입력을
//! 제어기로 흘려보낸다.

pub mod dispatcher;
pub mod event_bus;
pub mod lifecycle;
pub mod prompt;
pub mod runner;
pub mod ticker;
