//! 설정 저장소.
//!
//! 플랫폼별 설정 디렉토리에 JSON 파일로 설정을 저장/로드하고,
//! 변경 시 `watch` 채널로 구독자에게 알린다.
//! 어떤 컨텍스트든 저장소의 현재 값을 단일 진실 공급원으로 삼는다.

use crate::config::AppConfig;
use crate::error::CoreError;
use directories::ProjectDirs;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// 설정 파일 이름
const CONFIG_FILE_NAME: &str = "config.json";

/// 설정 저장소
///
/// 설정 파일의 로드/저장, 런타임 변경, 변경 알림을 관리한다.
/// 복제본은 같은 상태를 공유한다.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// 현재 설정
    config: Arc<RwLock<AppConfig>>,
    /// 변경 알림 채널
    notify_tx: Arc<watch::Sender<AppConfig>>,
    /// 설정 파일 경로
    config_path: PathBuf,
}

impl SettingsStore {
    /// 플랫폼 기본 경로로 저장소 생성 및 설정 로드
    ///
    /// 설정 파일이 없으면 기본 설정을 생성하고 저장한다.
    pub fn new() -> Result<Self, CoreError> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// 지정된 경로로 저장소 생성
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::Config(format!(
                        "설정 디렉토리 생성 실패: {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default_config();
            Self::save_to_file(&config_path, &default_config)?;
            info!("기본 설정 파일 생성: {}", config_path.display());
            default_config
        };

        let (notify_tx, _) = watch::channel(config.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            notify_tx: Arc::new(notify_tx),
            config_path,
        })
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 변경 구독자 생성
    ///
    /// 수신자는 항상 최신 값을 보며, 중간 변경을 놓쳐도 마지막 값으로 수렴한다.
    pub fn subscribe(&self) -> watch::Receiver<AppConfig> {
        self.notify_tx.subscribe()
    }

    /// 설정 검증, 저장, 구독자 알림
    pub fn update(&self, new_config: AppConfig) -> Result<(), CoreError> {
        new_config.validate()?;

        Self::save_to_file(&self.config_path, &new_config)?;
        {
            let mut config = self.config.write();
            *config = new_config.clone();
        }
        debug!("설정 저장 완료: {}", self.config_path.display());

        self.notify_tx.send_replace(new_config);
        Ok(())
    }

    /// 특정 필드만 업데이트
    pub fn update_with<F>(&self, updater: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.get();
        updater(&mut config);
        self.update(config.clone())?;
        Ok(config)
    }

    /// 점(.)으로 구분된 경로의 값을 JSON으로 설정
    ///
    /// 예: `monitor.enabled` ← `true`, `monitor.filters.min_reward` ← `0.05`
    pub fn set_path(&self, key_path: &str, raw_value: &str) -> Result<AppConfig, CoreError> {
        let value: serde_json::Value = serde_json::from_str(raw_value)
            .unwrap_or_else(|_| serde_json::Value::String(raw_value.to_string()));

        let mut tree = serde_json::to_value(self.get())?;
        let mut cursor = &mut tree;
        for segment in key_path.split('.') {
            cursor = cursor
                .get_mut(segment)
                .ok_or_else(|| CoreError::validation(key_path, "알 수 없는 설정 키"))?;
        }
        *cursor = value;

        let config: AppConfig = serde_json::from_value(tree)
            .map_err(|e| CoreError::validation(key_path, format!("값 형식 오류: {e}")))?;
        self.update(config.clone())?;
        Ok(config)
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 파일에서 다시 로드
    ///
    /// 다른 프로세스가 파일을 바꾼 경우에만 구독자에게 알리고 `true`를 반환한다.
    pub fn reload(&self) -> Result<bool, CoreError> {
        let loaded = Self::load_from_file(&self.config_path)?;
        loaded.validate()?;

        let changed = {
            let mut current = self.config.write();
            if *current == loaded {
                false
            } else {
                *current = loaded.clone();
                true
            }
        };

        if changed {
            info!("설정 다시 로드 완료 (외부 변경 감지)");
            self.notify_tx.send_replace(loaded);
        }
        Ok(changed)
    }

    /// 플랫폼별 기본 설정 파일 경로
    fn default_config_path() -> Result<PathBuf, CoreError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// 플랫폼별 설정 디렉토리 경로
    ///
    /// - macOS: `~/Library/Application Support/dev.hubwatch.hubwatch/`
    /// - Windows: `%APPDATA%\hubwatch\hubwatch\config\`
    /// - Linux: `~/.config/hubwatch/`
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        ProjectDirs::from("dev", "hubwatch", "hubwatch")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    /// 파일에서 설정 로드
    fn load_from_file(path: &Path) -> Result<AppConfig, CoreError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("설정 파일 읽기 실패: {}: {}", path.display(), e))
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        debug!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 파일에 설정 저장
    fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}
