use std::path::{Path, PathBuf};
use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use advisory_chat::{
    AdvisoryBackend, AnswerRecord, AppendDiscipline, Config, Message, ModelSelector,
    PendingRequest, RequestTicket, SendError, Session, TransportError, KNOWN_MODELS,
};

type QueryOutcome = Result<Vec<AnswerRecord>, TransportError>;

/// Popups drawn over the chat screen; at most one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    ModelPicker,
    FilePrompt,
    /// Blocking message; any key dismisses it.
    Notice(String),
}

pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub backend: Arc<dyn AdvisoryBackend>,
    pub query_task: Option<(RequestTicket, JoinHandle<QueryOutcome>)>,
    /// Transcript entries drawn so far; answers are typed out one per tick.
    pub revealed: usize,

    // Model picker state
    pub models: ModelSelector,
    pub model_picker_state: ListState,

    pub overlay: Overlay,
    pub file_prompt: String,

    // Chat scrolling
    pub chat_scroll: u16,
    pub follow_tail: bool,
    pub max_chat_scroll: u16,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub base_url: String,
    pub max_file_bytes: u64,
    pub config_path: PathBuf,
}

impl App {
    pub fn new(config: &Config, config_path: PathBuf, backend: Arc<dyn AdvisoryBackend>) -> Self {
        Self {
            should_quit: false,
            session: Session::new(config),
            backend,
            query_task: None,
            revealed: 0,

            models: ModelSelector::new(&config.default_model),
            model_picker_state: ListState::default(),

            overlay: Overlay::None,
            file_prompt: String::new(),

            chat_scroll: 0,
            follow_tail: true,
            max_chat_scroll: 0,
            chat_area: None,

            animation_frame: 0,

            base_url: format!("{}{}", config.base_url, config.query_path),
            max_file_bytes: config.max_file_bytes,
            config_path,
        }
    }

    /// Send the composer's draft on a background task.
    pub fn send(&mut self) {
        match self.session.submit(self.models.current()) {
            Ok(PendingRequest { ticket, query }) => {
                let backend = Arc::clone(&self.backend);
                let handle = tokio::spawn(async move { backend.query(&query).await });
                self.query_task = Some((ticket, handle));
                self.reveal_all();
            }
            Err(err @ SendError::PayloadTooLarge { .. }) => {
                self.overlay = Overlay::Notice(err.to_string());
            }
            Err(SendError::EmptyInput) | Err(SendError::Busy) => {}
        }
    }

    /// Hand a finished background request to the session.
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .map(|(_, handle)| handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some((ticket, handle)) = self.query_task.take() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Err(TransportError::Network(format!("request task failed: {}", err))),
            };
            if self.session.resolve(ticket, outcome) {
                match self.session.discipline() {
                    AppendDiscipline::Batch => self.reveal_all(),
                    AppendDiscipline::Incremental => self.reveal_next(),
                }
            }
        }
    }

    pub fn cancel_query(&mut self) {
        if let Some((_ticket, handle)) = self.query_task.take() {
            handle.abort();
        }
        self.session.cancel();
        self.reveal_all();
    }

    /// Tick animation frame and type out the next answer
    pub fn tick(&mut self) {
        if self.session.busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.reveal_next();
    }

    /// The part of the transcript the chat pane shows.
    pub fn visible_messages(&self) -> &[Message] {
        let messages = self.session.transcript().messages();
        &messages[..self.revealed.min(messages.len())]
    }

    /// True while answers are still being typed out.
    pub fn revealing(&self) -> bool {
        self.revealed < self.session.transcript().len()
    }

    fn reveal_next(&mut self) {
        if self.revealing() {
            self.revealed += 1;
            self.follow_tail = true;
        }
    }

    fn reveal_all(&mut self) {
        self.revealed = self.session.transcript().len();
        self.follow_tail = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll);
        self.follow_tail = self.chat_scroll >= self.max_chat_scroll;
    }

    pub fn open_file_prompt(&mut self) {
        self.file_prompt.clear();
        self.overlay = Overlay::FilePrompt;
    }

    /// Attach the file named in the prompt; failures become a notice and
    /// leave any earlier attachment in place.
    pub async fn attach_from_prompt(&mut self) {
        let path = expand_home(self.file_prompt.trim());
        if path.as_os_str().is_empty() {
            self.overlay = Overlay::None;
            return;
        }

        match self
            .session
            .composer_mut()
            .attach_file(&path, self.max_file_bytes)
            .await
        {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Attached file");
                self.overlay = Overlay::None;
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "File attach failed");
                self.overlay = Overlay::Notice(err.to_string());
            }
        }
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        self.model_picker_state.select(Some(self.models.index().unwrap_or(0)));
        self.overlay = Overlay::ModelPicker;
    }

    pub fn model_picker_nav_down(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state
            .select(Some((i + 1).min(KNOWN_MODELS.len() - 1)));
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some((id, _)) = self
            .model_picker_state
            .selected()
            .and_then(|i| KNOWN_MODELS.get(i))
        {
            self.models.select(id);
            self.overlay = Overlay::None;
            // Save to config
            if let Err(err) = Config::save_default_model(&self.config_path, id) {
                tracing::warn!(error = %err, "Could not persist model choice");
            }
        }
    }
}

fn expand_home(input: &str) -> PathBuf {
    match input.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| Path::new(input).to_path_buf()),
        None => PathBuf::from(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_chat::OutboundQuery;
    use async_trait::async_trait;

    /// Answers with one record per comma-separated part of the question.
    struct EchoBackend;

    #[async_trait]
    impl AdvisoryBackend for EchoBackend {
        async fn query(&self, query: &OutboundQuery) -> Result<Vec<AnswerRecord>, TransportError> {
            Ok(query
                .chat
                .split(", ")
                .map(|part| AnswerRecord {
                    domain: Some("Echo".to_string()),
                    maturity_level: Some("1".to_string()),
                    response: Some(part.to_string()),
                    ..Default::default()
                })
                .collect())
        }
    }

    fn test_app(dir: &Path) -> App {
        App::new(&Config::new(), dir.join("config.json"), Arc::new(EchoBackend))
    }

    #[tokio::test]
    async fn test_send_and_poll_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.session.composer_mut().set_text("ping");
        app.send();
        assert!(app.session.busy());
        assert_eq!(app.session.composer().text(), "");

        while app.session.busy() {
            tokio::task::yield_now().await;
            app.poll_query().await;
        }
        assert!(app.query_task.is_none());
        assert_eq!(app.session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_answers_are_typed_out_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.session.composer_mut().set_text("one, two, three");
        app.send();
        assert_eq!(app.visible_messages().len(), 1);

        while app.session.busy() {
            tokio::task::yield_now().await;
            app.poll_query().await;
        }

        // Every answer is in the transcript; the screen catches up on ticks.
        assert_eq!(app.session.transcript().len(), 4);
        assert_eq!(app.visible_messages().len(), 2);
        assert!(app.revealing());
        app.tick();
        app.tick();
        assert_eq!(app.visible_messages().len(), 4);
        assert!(!app.revealing());
        app.tick();
        assert_eq!(app.visible_messages().len(), 4);
    }

    #[tokio::test]
    async fn test_batch_reveals_everything_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new();
        config.append = AppendDiscipline::Batch;
        let mut app = App::new(&config, dir.path().join("config.json"), Arc::new(EchoBackend));
        app.session.composer_mut().set_text("one, two");
        app.send();

        while app.session.busy() {
            tokio::task::yield_now().await;
            app.poll_query().await;
        }
        assert_eq!(app.visible_messages().len(), 3);
        assert!(!app.revealing());
    }

    #[tokio::test]
    async fn test_cancel_aborts_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.session.composer_mut().set_text("ping");
        app.send();
        app.cancel_query();

        assert!(app.query_task.is_none());
        assert!(!app.session.busy());
        assert_eq!(app.session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_attachment_shows_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        let bad = dir.path().join("slides.pptx");
        std::fs::write(&bad, "binary").unwrap();

        app.open_file_prompt();
        app.file_prompt = bad.display().to_string();
        app.attach_from_prompt().await;

        assert!(matches!(app.overlay, Overlay::Notice(_)));
        assert!(!app.session.composer().has_file());
    }

    #[tokio::test]
    async fn test_select_model_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.open_model_picker();
        app.model_picker_nav_down();
        app.select_model();

        assert_eq!(app.models.current(), "reka-flash");
        assert_eq!(app.overlay, Overlay::None);
        let saved = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.default_model, "reka-flash");
    }

    #[test]
    fn test_scrolling_toggles_follow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.max_chat_scroll = 10;
        app.chat_scroll = 10;
        app.scroll_up(3);
        assert_eq!(app.chat_scroll, 7);
        assert!(!app.follow_tail);
        app.scroll_down(5);
        assert_eq!(app.chat_scroll, 10);
        assert!(app.follow_tail);
    }
}
