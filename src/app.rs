use std::path::PathBuf;
use std::sync::Arc;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use docchat_core::{
    Config, DocumentService, ScrollCoordinator, ServerStatus, ServiceError, Session, StatusTicket,
    UploadReceipt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    FilePrompt,
}

type Pending<T> = JoinHandle<Result<T, ServiceError>>;

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Session state (transcript, status, selected file, in-flight flags)
    pub session: Session,
    pub scroll: ScrollCoordinator,

    // Question input
    pub input: String,
    pub input_cursor: usize, // cursor position in chars

    // File prompt input
    pub file_input: String,
    pub file_cursor: usize,

    // One-line message in the footer (selection errors, hints)
    pub notice: Option<String>,

    // Animation state
    pub animation_frame: u8,

    pub api_base: String,
    pub log_path: Option<PathBuf>,

    // Transcript area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Transcript length at the last render, to detect new messages
    seen_messages: usize,

    // Requests in flight
    ask_task: Option<Pending<String>>,
    upload_task: Option<Pending<UploadReceipt>>,
    status_tasks: Vec<(StatusTicket, Pending<ServerStatus>)>,
}

/// A task that panicked or was aborted never reached the service.
fn settle<T>(joined: Result<Result<T, ServiceError>, tokio::task::JoinError>) -> Result<T, ServiceError> {
    joined.unwrap_or_else(|err| Err(ServiceError::Transport(err.to_string())))
}

impl App {
    pub fn new(service: Arc<dyn DocumentService>, api_base: String, config: &Config) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            session: Session::new(service),
            scroll: ScrollCoordinator::new(config.scroll_threshold()),

            input: String::new(),
            input_cursor: 0,

            file_input: String::new(),
            file_cursor: 0,

            notice: None,
            animation_frame: 0,

            api_base,
            log_path: None,

            chat_area: None,
            seen_messages: 0,

            ask_task: None,
            upload_task: None,
            status_tasks: Vec::new(),
        }
    }

    pub fn has_messages(&self) -> bool {
        !self.session.conversation().is_empty()
    }

    /// Send is enabled only with a ready service, no ask in flight and a non-blank question
    pub fn can_send(&self) -> bool {
        self.session.can_ask() && !self.input.trim().is_empty()
    }

    pub fn refresh_status(&mut self) {
        let ticket = self.session.begin_status_check();
        let service = self.session.service();
        self.status_tasks
            .push((ticket, tokio::spawn(async move { service.status().await })));
    }

    pub fn send_question(&mut self) {
        if !self.session.is_ready() {
            self.notice = Some("Please upload a PDF document to start chatting!".to_string());
            return;
        }
        let Some(question) = self.session.begin_ask(&self.input) else {
            return;
        };
        self.input.clear();
        self.input_cursor = 0;

        let service = self.session.service();
        self.ask_task = Some(tokio::spawn(async move { service.ask(&question).await }));
    }

    pub fn start_upload(&mut self) {
        if self.session.pending_upload().is_none() {
            self.notice = Some("No file selected. Press 'o' to choose a PDF.".to_string());
            return;
        }
        let Some(file) = self.session.begin_upload() else {
            return;
        };
        self.notice = None;

        let service = self.session.service();
        self.upload_task = Some(tokio::spawn(async move { service.upload(&file).await }));
    }

    /// Select the file named in the file prompt
    pub fn select_file_from_prompt(&mut self) {
        let raw = self.file_input.trim();
        if raw.is_empty() {
            return;
        }
        let path = expand_home(raw);

        match self.session.select_file(path) {
            Ok(()) => {
                self.notice = self
                    .session
                    .pending_upload()
                    .map(|f| format!("Selected {}. Press 'u' to upload.", f.file_name));
                self.file_input.clear();
                self.file_cursor = 0;
                self.input_mode = InputMode::Normal;
            }
            Err(err) => {
                self.notice = Some(err.to_string());
            }
        }
    }

    pub fn deselect_file(&mut self) {
        self.session.deselect_file();
        self.notice = None;
    }

    pub fn clear_chat(&mut self) {
        self.session.clear_conversation();
        self.scroll.reset();
        self.seen_messages = 0;
    }

    /// Apply the results of requests that have settled since the last call
    pub async fn poll_tasks(&mut self) {
        if matches!(&self.ask_task, Some(handle) if handle.is_finished()) {
            if let Some(handle) = self.ask_task.take() {
                self.session.finish_ask(settle(handle.await));
            }
        }

        if matches!(&self.upload_task, Some(handle) if handle.is_finished()) {
            if let Some(handle) = self.upload_task.take() {
                if self.session.finish_upload(settle(handle.await)) {
                    self.refresh_status();
                }
            }
        }

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.status_tasks)
            .into_iter()
            .partition(|(_, handle)| handle.is_finished());
        self.status_tasks = running;
        for (ticket, handle) in finished {
            self.session.apply_status(ticket, settle(handle.await));
        }
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_asking() || self.session.is_uploading() || self.session.status().is_none() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Feed the transcript geometry measured during render into the scroll
    /// coordinator. A longer transcript than last time counts as a new message.
    pub fn sync_scroll(&mut self, content_height: u16, viewport_height: u16) {
        let len = self.session.conversation().len();
        if len > self.seen_messages {
            self.scroll.resize(self.scroll.content_height(), viewport_height);
            self.scroll.on_new_message(content_height);
        } else {
            self.scroll.resize(content_height, viewport_height);
        }
        self.seen_messages = len;
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let has_messages = self.has_messages();
        self.scroll.on_scroll(delta, has_messages);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = (self.scroll.viewport_height() / 2).max(1) as i32;
        self.scroll_by(half_page);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = (self.scroll.viewport_height() / 2).max(1) as i32;
        self.scroll_by(-half_page);
    }

    pub fn scroll_to_top(&mut self) {
        let has_messages = self.has_messages();
        self.scroll.scroll_to_top(has_messages);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll.scroll_to_bottom();
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::testing::{status, unreachable, ScriptedService};
    use docchat_core::Sender;
    use std::time::Duration;

    fn app_with(service: &Arc<ScriptedService>) -> App {
        App::new(
            Arc::clone(service) as Arc<dyn DocumentService>,
            "http://127.0.0.1:3001".to_string(),
            &Config::new(),
        )
    }

    /// Poll until no request is left in flight
    async fn settle_all(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks().await;
            if app.ask_task.is_none() && app.upload_task.is_none() && app.status_tasks.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("requests did not settle");
    }

    async fn ready_app(service: &Arc<ScriptedService>) -> App {
        service.push_status(Ok(status(true)));
        let mut app = app_with(service);
        app.refresh_status();
        settle_all(&mut app).await;
        app
    }

    #[tokio::test]
    async fn test_send_question_appends_answer() {
        let service = Arc::new(ScriptedService::new());
        service.push_answer(Ok("12M".to_string()));
        let mut app = ready_app(&service).await;
        app.input = "What is the revenue?".to_string();
        app.input_cursor = app.input.chars().count();

        app.send_question();
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.session.is_asking());
        assert!(!app.can_send());

        settle_all(&mut app).await;

        let messages: Vec<(Sender, &str)> = app
            .session
            .conversation()
            .messages()
            .iter()
            .map(|m| (m.sender(), m.content()))
            .collect();
        assert_eq!(
            messages,
            vec![(Sender::User, "What is the revenue?"), (Sender::Assistant, "12M")]
        );
        assert!(!app.session.is_asking());
    }

    #[tokio::test]
    async fn test_send_disabled_until_documents_ready() {
        let service = Arc::new(ScriptedService::new());
        service.push_status(Ok(status(false)));
        let mut app = app_with(&service);
        app.refresh_status();
        settle_all(&mut app).await;

        app.input = "hello".to_string();
        assert!(!app.can_send());
        app.send_question();

        assert!(app.session.conversation().is_empty());
        assert_eq!(app.input, "hello");
        assert!(service.questions().is_empty());
    }

    #[tokio::test]
    async fn test_status_failure_keeps_checking_state() {
        let service = Arc::new(ScriptedService::new());
        service.push_status(Err(unreachable()));
        let mut app = app_with(&service);

        app.refresh_status();
        settle_all(&mut app).await;

        assert!(app.session.status().is_none());
        assert!(app.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_upload_success_triggers_status_refresh() {
        let service = Arc::new(ScriptedService::new());
        service
            .push_upload(Ok(UploadReceipt { filename: "report.pdf".to_string() }))
            .push_status(Ok(status(true)));
        let mut app = app_with(&service);
        app.file_input = "/tmp/report.pdf".to_string();
        app.input_mode = InputMode::FilePrompt;

        app.select_file_from_prompt();
        assert_eq!(app.input_mode, InputMode::Normal);
        app.start_upload();
        assert!(app.session.is_uploading());
        settle_all(&mut app).await;

        assert!(!app.session.is_uploading());
        assert!(app.session.pending_upload().is_none());
        assert_eq!(service.status_calls(), 1);
        assert!(app.session.is_ready());
        assert!(app.session.conversation().messages()[0].content().contains("report.pdf"));
    }

    #[test]
    fn test_non_pdf_selection_is_reported_in_footer() {
        let service = Arc::new(ScriptedService::new());
        let mut app = app_with(&service);
        app.file_input = "/tmp/notes.txt".to_string();
        app.input_mode = InputMode::FilePrompt;

        app.select_file_from_prompt();

        assert!(app.session.pending_upload().is_none());
        assert_eq!(app.input_mode, InputMode::FilePrompt);
        assert!(app.notice.as_deref().unwrap_or_default().contains("not a PDF"));
        assert!(app.session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_scrolled_up_view_keeps_position_on_new_message() {
        let service = Arc::new(ScriptedService::new());
        service.push_answer(Ok("answer".to_string()));
        let mut app = ready_app(&service).await;
        app.input = "question".to_string();
        app.send_question();
        settle_all(&mut app).await;
        app.sync_scroll(60, 20);
        assert_eq!(app.scroll.offset(), 40);

        app.scroll_by(-30);
        assert!(app.scroll.show_jump_to_bottom());
        app.session.finish_ask(Ok("late".to_string()));
        app.sync_scroll(70, 20);

        assert_eq!(app.scroll.offset(), 10);
        assert!(app.scroll.show_jump_to_bottom());

        app.scroll_to_bottom();
        assert_eq!(app.scroll.offset(), 50);
        assert!(!app.scroll.show_jump_to_bottom());
    }

    #[tokio::test]
    async fn test_clear_chat_resets_transcript_and_scroll() {
        let service = Arc::new(ScriptedService::new());
        service.push_answer(Ok("answer".to_string()));
        let mut app = ready_app(&service).await;
        app.input = "question".to_string();
        app.send_question();
        settle_all(&mut app).await;
        app.sync_scroll(60, 20);

        app.clear_chat();

        assert!(!app.has_messages());
        assert_eq!(app.scroll.offset(), 0);
        assert!(!app.scroll.show_jump_to_bottom());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/file.pdf"), PathBuf::from("/abs/file.pdf"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/docs/a.pdf"), home.join("docs/a.pdf"));
        }
    }
}
