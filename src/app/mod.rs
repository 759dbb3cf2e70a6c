use std::path::Path;
use std::sync::Arc;

use crate::analysis::{
    spawn_analysis, AnalysisPipeline, AnalysisReport, CancellableSleeper, InferenceTransport,
    ReqwestTransport, RetryPolicy, Sleeper, TransportError,
};
use crate::capture::{FileImageSource, ImagePayload, ImageSource};
use crate::config::{self, AppConfig};
use crate::error::{AppError, AppResult};
use crate::persistence::{FileKeyValueStore, SharedKeyValueStore};
use crate::settings::{AppSettings, SettingsStore};
use crate::share::{share_record, ShareFormat, ShareTarget};
use crate::storage::{AnalysisRecord, HistoryFilter, RecordStore, RECENT_LIMIT};
use crate::theme::{ThemeMode, ThemeState};

/// Delivers "analysis finished" notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, body: &str);
}

#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) {
        crate::notification::send(body);
    }
}

/// Collaborators shared by every screen, built once at startup.
pub struct App {
    records: Arc<RecordStore>,
    theme: ThemeState,
    settings: SettingsStore,
    pipeline: Option<Arc<AnalysisPipeline>>,
    notifier: Box<dyn Notifier>,
}

impl App {
    /// Opens the on-disk store and the HTTP transport described by `config`.
    /// A missing API key leaves the history usable but rejects new analyses.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let data_dir = config::data_dir(config)?;
        let kv: SharedKeyValueStore = Arc::new(FileKeyValueStore::open(&data_dir)?);
        tracing::debug!(data_dir = %data_dir.display(), "opened data directory");

        let transport: Option<Box<dyn InferenceTransport>> =
            match ReqwestTransport::from_config(config) {
                Ok(transport) => Some(Box::new(transport)),
                Err(TransportError::MissingApiKey) => {
                    tracing::debug!("no API key configured; analysis disabled");
                    None
                }
                Err(err) => return Err(err.into()),
            };

        Ok(Self::with_parts(
            kv,
            transport,
            Box::new(CancellableSleeper),
            RetryPolicy::from_config(config),
            Box::new(DesktopNotifier),
        ))
    }

    pub fn with_parts(
        kv: SharedKeyValueStore,
        transport: Option<Box<dyn InferenceTransport>>,
        sleeper: Box<dyn Sleeper>,
        policy: RetryPolicy,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let records = Arc::new(RecordStore::new(kv.clone()));
        let pipeline = transport.map(|transport| {
            Arc::new(AnalysisPipeline::new(
                transport,
                sleeper,
                records.clone(),
                policy,
            ))
        });
        Self {
            records,
            theme: ThemeState::load(kv.clone()),
            settings: SettingsStore::new(kv),
            pipeline,
            notifier,
        }
    }

    pub fn analyze_file(&self, path: &Path) -> AppResult<AnalysisReport> {
        let payload = FileImageSource::new(path).acquire()?;
        self.analyze(payload)
    }

    pub fn analyze(&self, payload: ImagePayload) -> AppResult<AnalysisReport> {
        let pipeline = self
            .pipeline
            .clone()
            .ok_or(AppError::Transport(TransportError::MissingApiKey))?;
        let report = spawn_analysis(pipeline, Some(payload)).wait()?;
        if self.settings.load().notifications {
            self.notifier.notify("Your plant analysis is ready.");
        }
        Ok(report)
    }

    pub fn history(&self, filter: HistoryFilter) -> Vec<AnalysisRecord> {
        self.records.list_filtered(filter)
    }

    pub fn recent(&self) -> Vec<AnalysisRecord> {
        self.records.recent(RECENT_LIMIT)
    }

    pub fn record(&self, id: &str) -> AppResult<AnalysisRecord> {
        self.records
            .get(id)
            .ok_or_else(|| AppError::UnknownRecord(id.to_string()))
    }

    /// Sets the favorite flag, or flips it when `value` is `None`.
    pub fn favorite(&self, id: &str, value: Option<bool>) -> AppResult<bool> {
        let updated = match value {
            Some(value) => self.records.set_favorite(id, value)?.then_some(value),
            None => self.records.toggle_favorite(id)?,
        };
        updated.ok_or_else(|| AppError::UnknownRecord(id.to_string()))
    }

    pub fn delete(&self, id: &str) -> AppResult<()> {
        if self.records.delete(id)? {
            Ok(())
        } else {
            Err(AppError::UnknownRecord(id.to_string()))
        }
    }

    pub fn share<T: ShareTarget>(&self, id: &str, format: ShareFormat, target: &T) -> AppResult<()> {
        let record = self.record(id)?;
        share_record(target, &record, format)?;
        Ok(())
    }

    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    pub fn toggle_theme(&self) -> AppResult<ThemeMode> {
        Ok(self.theme.toggle()?)
    }

    pub fn settings(&self) -> AppSettings {
        self.settings.load()
    }

    pub fn update_setting(&self, name: &str, value: bool) -> AppResult<AppSettings> {
        Ok(self
            .settings
            .update(|settings| settings.set_by_name(name, value))?)
    }

    pub fn reset_settings(&self) -> AppResult<AppSettings> {
        self.settings.reset()?;
        Ok(self.settings.load())
    }

    /// Destroys the history and the settings blob.
    pub fn clear_all(&self) -> AppResult<()> {
        self.records.clear_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, TransportResponse, TransportResult};
    use crate::analysis::wire::GenerateContentRequest;
    use crate::persistence::MemoryKeyValueStore;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedTransport(u16, &'static str);

    impl InferenceTransport for FixedTransport {
        fn send(&self, _request: &GenerateContentRequest) -> TransportResult<TransportResponse> {
            Ok(TransportResponse::new(self.0, self.1))
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn pause(&self, _delay: Duration, _cancel: &crate::analysis::CancelToken) -> bool {
            true
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier(Arc<Mutex<Vec<String>>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, body: &str) {
            self.0.lock().unwrap().push(body.to_string());
        }
    }

    const SUCCESS_BODY: &str = r#"{"candidates":[{"content":{"parts":[{"text":"Rust fungus detected."}]}}]}"#;

    fn app(transport: Option<Box<dyn InferenceTransport>>) -> (App, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let app = App::with_parts(
            MemoryKeyValueStore::shared(),
            transport,
            Box::new(NoSleep),
            RetryPolicy::default(),
            Box::new(notifier.clone()),
        );
        (app, notifier)
    }

    fn image() -> ImagePayload {
        ImagePayload::from_base64("bGVhZg==", None)
    }

    #[test]
    fn analyze_stores_record_and_notifies() {
        let (app, notifier) = app(Some(Box::new(FixedTransport(200, SUCCESS_BODY))));
        let report = app.analyze(image()).unwrap();

        assert_eq!(app.history(HistoryFilter::All), vec![report.record.clone()]);
        assert_eq!(app.record(&report.record.id).unwrap(), report.record);
        assert_eq!(notifier.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn disabled_notifications_stay_quiet() {
        let (app, notifier) = app(Some(Box::new(FixedTransport(200, SUCCESS_BODY))));
        app.update_setting("notifications", false).unwrap();
        app.analyze(image()).unwrap();
        assert!(notifier.0.lock().unwrap().is_empty());
    }

    #[test]
    fn analyze_without_transport_reports_missing_key() {
        let (app, _) = app(None);
        let err = app.analyze(image()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Transport(TransportError::MissingApiKey)
        ));
    }

    #[test]
    fn pipeline_failures_surface_user_message() {
        let (app, notifier) = app(Some(Box::new(FixedTransport(429, ""))));
        let err = app.analyze(image()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Analysis(AnalysisError::RateLimitExhausted { .. })
        ));
        assert_eq!(
            err.user_message(),
            AnalysisError::RateLimitExhausted { attempts: 3 }.user_message()
        );
        assert!(app.history(HistoryFilter::All).is_empty());
        assert!(notifier.0.lock().unwrap().is_empty());
    }

    #[test]
    fn favorite_delete_and_unknown_ids() {
        let (app, _) = app(Some(Box::new(FixedTransport(200, SUCCESS_BODY))));
        let id = app.analyze(image()).unwrap().record.id;

        assert!(app.favorite(&id, None).unwrap());
        assert_eq!(app.history(HistoryFilter::Favorites).len(), 1);
        assert!(!app.favorite(&id, Some(false)).unwrap());
        assert!(app.history(HistoryFilter::Favorites).is_empty());

        assert!(matches!(
            app.favorite("nope", Some(true)),
            Err(AppError::UnknownRecord(_))
        ));
        app.delete(&id).unwrap();
        assert!(matches!(app.delete(&id), Err(AppError::UnknownRecord(_))));
    }

    #[test]
    fn clear_all_resets_history_and_settings() {
        let (app, _) = app(Some(Box::new(FixedTransport(200, SUCCESS_BODY))));
        app.analyze(image()).unwrap();
        app.update_setting("auto-save", false).unwrap();

        app.clear_all().unwrap();
        assert!(app.recent().is_empty());
        assert_eq!(app.settings(), AppSettings::default());
    }

    #[derive(Default)]
    struct CapturingTarget(Mutex<Vec<String>>);

    impl ShareTarget for CapturingTarget {
        fn share(&self, text: &str) -> crate::share::ShareResult<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn share_hands_chosen_format_to_target() {
        let (app, _) = app(Some(Box::new(FixedTransport(200, SUCCESS_BODY))));
        let id = app.analyze(image()).unwrap().record.id;
        let target = CapturingTarget::default();

        app.share(&id, ShareFormat::Text, &target).unwrap();
        app.share(&id, ShareFormat::DataUri, &target).unwrap();

        let shared = target.0.lock().unwrap();
        assert_eq!(shared[0], "Plant Analysis - PlantAI\n\nRust fungus detected.");
        assert!(shared[1].starts_with("data:text/plain;base64,"));
        assert!(matches!(
            app.share("nope", ShareFormat::Text, &target),
            Err(AppError::UnknownRecord(_))
        ));
    }

    #[test]
    fn reset_settings_restores_defaults() {
        let (app, _) = app(None);
        app.update_setting("notifications", false).unwrap();
        app.update_setting("high-quality-images", false).unwrap();

        assert_eq!(app.reset_settings().unwrap(), AppSettings::default());
        assert_eq!(app.settings(), AppSettings::default());
    }

    #[test]
    fn toggle_theme_flips_mode() {
        let (app, _) = app(None);
        assert_eq!(app.theme().mode(), ThemeMode::Light);
        assert_eq!(app.toggle_theme().unwrap(), ThemeMode::Dark);
    }
}
