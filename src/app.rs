use crate::analytics::{self, AnalyticsSink, SessionInfo};
use crate::catalog::{ALL, Catalog, CatalogError, CategoryFilter};
use crate::config::Config;
use crate::engine::question::KindPolicy;
use crate::session::{Phase, QuizSession};
use crate::store::{ProgressRecord, ProgressStore};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Loading,
    LoadFailed,
    ScriptSelect,
    Quiz,
    Completed,
    Stats,
    Settings,
}

pub const SETTINGS_COUNT: usize = 6;

pub struct App {
    pub screen: AppScreen,
    pub theme: &'static Theme,
    pub config: Config,
    pub catalog: Option<Catalog>,
    pub load_error: Option<String>,
    pub scripts: Vec<String>,
    pub script_selected: usize,
    pub active_script: Option<String>,
    pub session: Option<QuizSession>,
    pub progress: ProgressStore,
    pub should_quit: bool,
    pub settings_selected: usize,
    pub stats_scroll: usize,
    pub stats_confirm_reset: bool,
    /// Write config changes to disk. Off for throwaway apps.
    pub persist_settings: bool,
    analytics: Box<dyn AnalyticsSink>,
    seed: Option<u64>,
    pending_script: Option<String>,
}

impl App {
    pub fn new(config: Config, progress: ProgressStore) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let analytics = analytics::from_config(&config);

        Self {
            screen: AppScreen::Loading,
            theme,
            config,
            catalog: None,
            load_error: None,
            scripts: Vec::new(),
            script_selected: 0,
            active_script: None,
            session: None,
            progress,
            should_quit: false,
            settings_selected: 0,
            stats_scroll: 0,
            stats_confirm_reset: false,
            persist_settings: false,
            analytics,
            seed: None,
            pending_script: None,
        }
    }

    /// Every quiz started afterwards replays deterministically.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Script to start as soon as the catalog arrives.
    pub fn with_pending_script(mut self, script: Option<String>) -> Self {
        self.pending_script = script;
        self
    }

    pub fn on_catalog_loaded(&mut self, result: Result<Catalog, CatalogError>) {
        match result {
            Ok(catalog) => {
                self.catalog = Some(catalog);
                self.load_error = None;
                self.refresh_scripts();
                if let Some(last) = &self.config.last_script {
                    if let Some(idx) = self.scripts.iter().position(|s| s == last) {
                        self.script_selected = idx;
                    }
                }
                self.screen = AppScreen::ScriptSelect;
                if let Some(script) = self.pending_script.take() {
                    self.start_quiz(&script);
                }
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
                self.screen = AppScreen::LoadFailed;
            }
        }
    }

    pub fn refresh_scripts(&mut self) {
        self.scripts = self
            .catalog
            .as_ref()
            .map(|c| c.list_scripts(self.config.include_unreleased))
            .unwrap_or_default();
        if self.script_selected >= self.scripts.len() {
            self.script_selected = 0;
        }
    }

    pub fn script_next(&mut self) {
        if !self.scripts.is_empty() {
            self.script_selected = (self.script_selected + 1) % self.scripts.len();
        }
    }

    pub fn script_prev(&mut self) {
        if !self.scripts.is_empty() {
            self.script_selected = if self.script_selected == 0 {
                self.scripts.len() - 1
            } else {
                self.script_selected - 1
            };
        }
    }

    pub fn start_selected_quiz(&mut self) {
        if let Some(script) = self.scripts.get(self.script_selected).cloned() {
            self.start_quiz(&script);
        }
    }

    pub fn start_quiz(&mut self, script: &str) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        let filter = self.config.category_filter();
        let pool = catalog.characters_for_script(script, filter);
        let broader = catalog.characters_for_script(
            ALL,
            CategoryFilter {
                include_unreleased: filter.include_unreleased,
                ..CategoryFilter::default()
            },
        );

        let options = self.config.quiz_options();
        let session = match self.seed {
            Some(seed) => QuizSession::seeded(options, seed),
            None => QuizSession::from_entropy(options),
        };
        let mut session = session.with_distractor_pool(broader);

        self.analytics.log_session(&SessionInfo {
            script: script.to_string(),
            include_travellers: filter.include_travellers,
            character_count: pool.len(),
        });
        session.start(pool, &self.progress);

        self.session = Some(session);
        self.active_script = Some(script.to_string());
        self.config.last_script = Some(script.to_string());
        self.save_config();
        self.screen = AppScreen::Quiz;
    }

    pub fn answer(&mut self, index: usize) -> Option<bool> {
        let session = self.session.as_mut()?;
        session.submit_index(index, &mut self.progress)
    }

    pub fn next_question(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.advance(&self.progress);
        if session.phase() == Phase::Completed {
            self.screen = AppScreen::Completed;
        }
    }

    pub fn restart_quiz(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.restart(&self.progress);
            self.screen = AppScreen::Quiz;
        }
    }

    /// Drops the running quiz. Its position is not kept.
    pub fn go_to_script_select(&mut self) {
        self.session = None;
        self.active_script = None;
        self.screen = if self.catalog.is_some() {
            AppScreen::ScriptSelect
        } else {
            AppScreen::LoadFailed
        };
    }

    /// Earlier answers for the character in the current question.
    pub fn current_record(&self) -> Option<&ProgressRecord> {
        let question = self.session.as_ref()?.current()?;
        self.progress.get(&question.character.name)
    }

    pub fn go_to_stats(&mut self) {
        self.stats_scroll = 0;
        self.stats_confirm_reset = false;
        self.screen = AppScreen::Stats;
    }

    pub fn stats_scroll_down(&mut self) {
        let rows = self.progress.by_weakness().len();
        if self.stats_scroll + 1 < rows {
            self.stats_scroll += 1;
        }
    }

    pub fn stats_scroll_up(&mut self) {
        self.stats_scroll = self.stats_scroll.saturating_sub(1);
    }

    pub fn request_reset(&mut self) {
        self.stats_confirm_reset = true;
    }

    pub fn confirm_reset(&mut self, confirmed: bool) {
        if confirmed {
            self.progress.reset_all();
            self.stats_scroll = 0;
        }
        self.stats_confirm_reset = false;
    }

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    pub fn leave_settings(&mut self) {
        self.save_config();
        self.go_to_script_select();
    }

    pub fn settings_next(&mut self) {
        self.settings_selected = (self.settings_selected + 1) % SETTINGS_COUNT;
    }

    pub fn settings_prev(&mut self) {
        self.settings_selected = (self.settings_selected + SETTINGS_COUNT - 1) % SETTINGS_COUNT;
    }

    pub fn settings_cycle_forward(&mut self) {
        self.settings_cycle(true);
    }

    pub fn settings_cycle_backward(&mut self) {
        self.settings_cycle(false);
    }

    fn settings_cycle(&mut self, forward: bool) {
        match self.settings_selected {
            0 => {
                let themes = Theme::available_themes();
                self.config.theme = cycle(&themes, &self.config.theme, forward);
                if let Some(new_theme) = Theme::load(&self.config.theme) {
                    let theme: &'static Theme = Box::leak(Box::new(new_theme));
                    self.theme = theme;
                }
            }
            1 => {
                self.config.question_kind =
                    cycle(&KindPolicy::ALL, &self.config.question_kind, forward);
            }
            2 => {
                self.config.selection_mode = self.config.selection_mode.toggled();
            }
            3 => {
                self.config.include_travellers = !self.config.include_travellers;
            }
            4 => {
                self.config.include_fabled = !self.config.include_fabled;
            }
            5 => {
                self.config.include_unreleased = !self.config.include_unreleased;
                self.refresh_scripts();
            }
            _ => {}
        }
    }

    /// Label and current value of each settings row.
    pub fn settings_rows(&self) -> Vec<(&'static str, String)> {
        let on_off = |b: bool| if b { "On" } else { "Off" }.to_string();
        vec![
            ("Theme", self.config.theme.clone()),
            ("Question kind", self.config.question_kind.label().to_string()),
            ("Selection", self.config.selection_mode.label().to_string()),
            ("Include travellers", on_off(self.config.include_travellers)),
            ("Include fabled", on_off(self.config.include_fabled)),
            ("Show unreleased", on_off(self.config.include_unreleased)),
        ]
    }

    fn save_config(&self) {
        if !self.persist_settings {
            return;
        }
        if let Err(e) = self.config.save() {
            log::warn!("failed to save config: {e:#}");
        }
    }
}

fn cycle<T: Clone + PartialEq>(items: &[T], current: &T, forward: bool) -> T {
    let Some(first) = items.first() else {
        return current.clone();
    };
    match items.iter().position(|t| t == current) {
        Some(idx) => {
            let next = if forward {
                (idx + 1) % items.len()
            } else if idx == 0 {
                items.len() - 1
            } else {
                idx - 1
            };
            items[next].clone()
        }
        None => first.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Character, TROUBLE_BREWING};
    use crate::engine::selector::SelectionMode;

    fn catalog() -> Catalog {
        let tb = |name: &str, ability: &str, category| {
            Character::new(name, ability, category, TROUBLE_BREWING)
        };
        Catalog::new(vec![
            tb("Chef", "You start knowing how many pairs of evil players there are.", Category::Townsfolk),
            tb("Empath", "Each night, you learn how many of your 2 alive neighbors are evil.", Category::Townsfolk),
            tb("Imp", "Each night*, choose a player: they die.", Category::Demon),
            tb("Thief", "Each night, choose a player: their vote counts negatively.", Category::Traveller),
        ])
        .unwrap()
    }

    fn app() -> App {
        App::new(Config::default(), ProgressStore::in_memory()).with_seed(Some(7))
    }

    #[test]
    fn load_failure_shows_error_screen() {
        let mut app = app();
        app.on_catalog_loaded(Err(CatalogError::Empty));
        assert_eq!(app.screen, AppScreen::LoadFailed);
        assert!(app.load_error.is_some());
    }

    #[test]
    fn catalog_arrival_selects_last_script() {
        let mut config = Config::default();
        config.last_script = Some("All".to_string());
        let mut app = App::new(config, ProgressStore::in_memory());
        app.on_catalog_loaded(Ok(catalog()));
        assert_eq!(app.screen, AppScreen::ScriptSelect);
        assert_eq!(app.scripts[app.script_selected], "All");
    }

    #[test]
    fn pending_script_starts_immediately() {
        let mut app = app().with_pending_script(Some(TROUBLE_BREWING.to_string()));
        app.on_catalog_loaded(Ok(catalog()));
        assert_eq!(app.screen, AppScreen::Quiz);
        let session = app.session.as_ref().unwrap();
        // travellers are off by default
        assert_eq!(session.pool_len(), 3);
    }

    #[test]
    fn full_run_reaches_completed_and_records_progress() {
        let mut app = app();
        app.on_catalog_loaded(Ok(catalog()));
        app.start_quiz(TROUBLE_BREWING);
        for _ in 0..3 {
            assert!(app.answer(0).is_some());
            assert!(app.current_record().is_some());
            app.next_question();
        }
        assert_eq!(app.screen, AppScreen::Completed);
        assert_eq!(app.progress.totals().characters, 3);

        app.restart_quiz();
        assert_eq!(app.screen, AppScreen::Quiz);
    }

    #[test]
    fn leaving_quiz_drops_session() {
        let mut app = app();
        app.on_catalog_loaded(Ok(catalog()));
        app.start_quiz(TROUBLE_BREWING);
        app.go_to_script_select();
        assert!(app.session.is_none());
        assert_eq!(app.screen, AppScreen::ScriptSelect);
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut app = app();
        app.progress.record_answer("Imp", true);
        app.go_to_stats();
        app.request_reset();
        app.confirm_reset(false);
        assert!(!app.progress.is_empty());
        app.request_reset();
        app.confirm_reset(true);
        assert!(app.progress.is_empty());
        assert!(!app.stats_confirm_reset);
    }

    #[test]
    fn settings_cycle_values() {
        let mut app = app();
        app.settings_selected = 1;
        app.settings_cycle_forward();
        assert_eq!(app.config.question_kind, KindPolicy::AbilityFromName);
        app.settings_cycle_backward();
        app.settings_cycle_backward();
        assert_eq!(app.config.question_kind, KindPolicy::NameFromAbility);

        app.settings_selected = 2;
        app.settings_cycle_forward();
        assert_eq!(app.config.selection_mode, SelectionMode::Adaptive);

        app.settings_prev();
        app.settings_prev();
        app.settings_prev();
        assert_eq!(app.settings_selected, SETTINGS_COUNT - 1);
    }
}
