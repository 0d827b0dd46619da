use std::rc::Rc;
use std::time::Duration;

use eframe::egui;
use strum::Display;

use crate::api::ApiClient;
use crate::auth::Auth;
use crate::config::{ApiConfig, WaveformConfig};
use crate::state::AppState;
use crate::storage::Storage;
use crate::studio::Studio;
use crate::task::TaskRunner;
use crate::transport::Transport;
use crate::ui::auth_forms::{SignInView, SignUpView};
use crate::ui::header::{Header, HeaderAction};
use crate::ui::history::HistoryView;
use crate::ui::profile::ProfileView;
use crate::ui::studio::StudioView;
use crate::ui::{about, home};
use crate::waveform::AudioDevice;

/// How often to poll while network tasks are in flight.
const TASK_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum Page {
    #[default]
    Home,
    Studio,
    History,
    Profile,
    About,
    #[strum(to_string = "Sign in")]
    SignIn,
    #[strum(to_string = "Sign up")]
    SignUp,
}

impl Page {
    pub const NAV: [Page; 5] = [Page::Home, Page::Studio, Page::History, Page::Profile, Page::About];
}

pub struct Backends<T> {
    pub api: ApiConfig,
    pub transport: T,
    pub storage: Storage,
    pub audio: Box<dyn AudioDevice>,
}

pub struct MoodStudioApp<T> {
    state: AppState,
    runner: TaskRunner,
    audio: Box<dyn AudioDevice>,
    waveform: WaveformConfig,
    auth: Auth<T>,
    page: Page,
    header: Header,
    studio: StudioView<T>,
    history: HistoryView,
    profile: ProfileView,
    sign_in: SignInView<T>,
    sign_up: SignUpView<T>,
}

impl<T: Transport + 'static> MoodStudioApp<T> {
    pub fn new(backends: Backends<T>) -> Self {
        let Backends {
            api,
            transport,
            storage,
            audio,
        } = backends;
        if !api.is_configured() {
            log::warn!("No API base URL configured; generation and sign-in are disabled");
        }

        let state = AppState::load(storage);
        let runner = TaskRunner::new();
        let client = Rc::new(ApiClient::new(api, transport));
        let auth = Auth::new(Rc::clone(&client), state.clone());
        let studio = Studio::new(client, state.clone(), runner.spawner());

        Self {
            header: Header::new(&state),
            studio: StudioView::new(studio, runner.spawner()),
            history: HistoryView::default(),
            profile: ProfileView::default(),
            sign_in: SignInView::new(auth.clone(), runner.spawner()),
            sign_up: SignUpView::new(auth.clone(), runner.spawner()),
            auth,
            state,
            runner,
            audio,
            waveform: WaveformConfig::default(),
            page: Page::default(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn navigate(&mut self, to: Page) {
        if to == self.page {
            return;
        }
        match self.page {
            Page::Studio => self.studio.leave(),
            Page::History => self.history.leave(),
            _ => {}
        }
        match to {
            Page::Studio => self.studio.enter(&self.state),
            Page::SignIn => {
                if let Some(notice) = self.sign_up.take_handoff() {
                    self.sign_in.set_notice(notice);
                }
            }
            _ => {}
        }
        log::debug!("Navigating {} -> {to}", self.page);
        self.page = to;
    }

    /// One frame: drive pending tasks, then draw the current page.
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.runner.run_until_stalled();

        let mut go = None;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            match self.header.show(ui, self.page) {
                Some(HeaderAction::Navigate(page)) => go = Some(page),
                Some(HeaderAction::Logout) => {
                    self.auth.logout();
                    go = Some(Page::Home);
                }
                None => {}
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let audio = self.audio.as_ref();
                let next = match self.page {
                    Page::Home => home::show(ui, &self.state),
                    Page::Studio => {
                        self.studio.show(ui, &self.state, audio, &self.waveform);
                        None
                    }
                    Page::History => {
                        self.history.show(ui, &self.state, audio, &self.waveform);
                        None
                    }
                    Page::Profile => {
                        self.profile.show(ui, &self.state);
                        None
                    }
                    Page::About => {
                        about::show(ui);
                        None
                    }
                    Page::SignIn => self.sign_in.show(ui),
                    Page::SignUp => self.sign_up.show(ui),
                };
                if next.is_some() {
                    go = next;
                }
            });
        });

        if let Some(page) = go {
            self.navigate(page);
            ctx.request_repaint();
        }
        if self.runner.has_pending() {
            ctx.request_repaint_after(TASK_POLL_INTERVAL);
        }
    }
}

impl<T: Transport + 'static> eframe::App for MoodStudioApp<T> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}
