//! # hubwatch-ui
//!
//! 사용자에게 보이는 표면 어댑터. 현재는 데스크톱 알림만 제공한다.

pub mod notifier;
