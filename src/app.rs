//! Main application UI and state management.
//! Handles the deck management interface and spaced repetition study sessions.

use crate::database::store::CardStore;
use crate::export::json::{export_json_to_path, import_json};
use crate::models::{Card, Deck, DeckSet, StudySession};
use chrono::{DateTime, Utc};
use eframe::egui;
use std::sync::{Arc, Mutex};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    StudySession,
}

/// Main application state
#[derive(Default)]
pub struct NurseDeckApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    all_decks: DeckSet,
    selected_deck_index: Option<usize>,
    current_front: String,
    current_back: String,
    new_deck_name: String,
    store: Option<Arc<Mutex<CardStore>>>,

    current_screen: AppScreen,
    study_session: Option<StudySession>,

    current_date_display: String,

    show_export_dialog: bool,
    show_status_dialog: bool,
    status_message: String,
}

/// Formats a date as YYYY-MM-DD string
fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl eframe::App for NurseDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::StudySession => self.render_study_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.allowed_to_close {
                // Allow close
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_confirmation_dialog = true;
            }
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        // exporting a deck
        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, deck) in self.all_decks.decks.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", deck.name, deck.cards.len()))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_status_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.status_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_status_dialog = false;
                    }
                });
        }
    }
}

impl NurseDeckApp {
    /// Creates a new application instance with decks loaded from the store
    pub fn new_with_deckset(deckset: DeckSet, store: CardStore) -> Self {
        let current_date = store
            .current_date()
            .map(format_date)
            .unwrap_or_else(|_| "Unknown".to_string());
        let has_decks = !deckset.decks.is_empty();
        Self {
            all_decks: deckset,
            selected_deck_index: if has_decks { Some(0) } else { None },
            store: Some(Arc::new(Mutex::new(store))),
            current_date_display: current_date,
            ..Default::default()
        }
    }

    fn show_status(&mut self, message: String) {
        self.status_message = message;
        self.show_status_dialog = true;
    }

    /// Renders the main screen with deck management interface
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // Fetch and display the simulated current date
                if let Some(store) = &self.store {
                    if let Ok(store_guard) = store.lock() {
                        if let Ok(current_date) = store_guard.current_date() {
                            self.current_date_display = format_date(current_date);
                        }
                    }
                }
                ui.label(self.current_date_display.to_string());

                if ui.button("Next Day").clicked() {
                    if let Some(store) = &self.store {
                        let store = store.lock().unwrap();
                        match store.advance_day() {
                            Ok(next) => self.current_date_display = format_date(next),
                            Err(e) => log::warn!("failed to advance day: {e}"),
                        }
                    }
                }
            });
            ui.separator();

            // Import/Export buttons
            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            // Deck creation section
            ui.heading("Create New Deck");
            let mut deck_error: Option<String> = None;
            ui.horizontal(|ui| {
                ui.label("Deck name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
                if ui.button("Create Deck").clicked() && !self.new_deck_name.is_empty() {
                    let mut created = false;
                    if let Some(store) = &self.store {
                        let store = store.lock().unwrap();
                        match store.add_deck(&self.new_deck_name) {
                            Ok(()) => created = true,
                            Err(e) => {
                                deck_error = Some(format!("Failed to create deck: {e}"));
                            }
                        }
                    }

                    if created {
                        self.all_decks.decks.push(Deck {
                            name: self.new_deck_name.clone(),
                            cards: Vec::new(),
                        });
                        self.new_deck_name.clear();
                    }
                }
            });
            if let Some(message) = deck_error {
                self.show_status(message);
            }

            ui.separator();

            ui.heading(format!("Decks ({})", self.all_decks.decks.len()));

            // We store actions to execute after UI rendering to avoid borrowing conflicts
            let mut action_select: Option<usize> = None;
            let mut action_study: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, deck) in self.all_decks.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);

                        let due = self
                            .store
                            .as_ref()
                            .and_then(|store| {
                                let store = store.lock().unwrap();
                                store.deck_stats(&deck.name).ok()
                            })
                            .map(|stats| stats.due)
                            .unwrap_or(0);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!(
                                        "{}. {} ({} cards, {} due)",
                                        i + 1,
                                        deck.name,
                                        deck.cards.len(),
                                        due
                                    ),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.button("Study").clicked() {
                                action_study = Some(i);
                            }
                        });
                    }
                });

            // Execute deferred actions
            if let Some(i) = action_select {
                self.selected_deck_index = Some(i);
            }
            if let Some(i) = action_study {
                self.start_study_session(i);
            }

            ui.separator();

            // Card management for selected deck
            if let Some(deck_index) = self.selected_deck_index {
                let mut card_error: Option<String> = None;

                if let Some(current_deck) = self.all_decks.decks.get_mut(deck_index) {
                    ui.heading(format!("Selected Deck: {}", current_deck.name));

                    if let Some(store) = &self.store {
                        let store = store.lock().unwrap();
                        if let Ok(stats) = store.deck_stats(&current_deck.name) {
                            ui.label(format!(
                                "Due: {} | New: {} | Learning: {} | Mature: {}",
                                stats.due, stats.new, stats.learning, stats.mature
                            ));
                        }
                    }

                    ui.horizontal(|ui| {
                        ui.label("Front:");
                        ui.text_edit_singleline(&mut self.current_front);
                    });

                    ui.horizontal(|ui| {
                        ui.label("Back:");
                        ui.text_edit_singleline(&mut self.current_back);
                    });
                    if ui.button("Add Card").clicked()
                        && !self.current_front.is_empty()
                        && !self.current_back.is_empty()
                    {
                        let mut added = false;
                        if let Some(store) = &self.store {
                            let store = store.lock().unwrap();
                            match store.add_card(
                                &current_deck.name,
                                &self.current_front,
                                &self.current_back,
                            ) {
                                Ok(_) => added = true,
                                Err(e) => card_error = Some(format!("Failed to add card: {e}")),
                            }
                        }

                        if added {
                            current_deck.cards.push(Card {
                                front: self.current_front.clone(),
                                back: self.current_back.clone(),
                            });
                            self.current_front.clear();
                            self.current_back.clear();
                        }
                    }

                    ui.separator();

                    ui.heading(format!("Cards ({})", current_deck.cards.len()));

                    egui::ScrollArea::vertical()
                        .id_source("cards_list")
                        .max_height(200.0)
                        .show(ui, |ui| {
                            for (i, card) in current_deck.cards.iter().enumerate() {
                                ui.group(|ui| {
                                    ui.label(format!("{}. Front: {}", i + 1, card.front));
                                    ui.label(format!("   Back: {}", card.back));
                                });
                            }
                        });
                }

                if let Some(message) = card_error {
                    self.show_status(message);
                }
            } else {
                ui.label("Select a deck to add cards");
            }
        });
    }

    /// Renders the study session screen with the card review interface
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        let mut grade_error: Option<String> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(session) = &mut self.study_session {
                ui.heading(format!("Studying: {}", session.deck_name));

                ui.label(session.phase_message());

                ui.label(format!(
                    "Progress: {} / {} recalled ({} remaining)",
                    session.recalled_count(),
                    session.total_count(),
                    session.remaining_count()
                ));

                if let Some(difficulty) = session.last_difficulty {
                    ui.label(format!("Last card rated: {}", difficulty.label()));
                }

                ui.add_space(20.0);

                if session.is_completed() {
                    ui.heading("Session complete!");
                    ui.label("Every due card in this deck has been reviewed.");

                    ui.add_space(20.0);

                    if ui.button("Back to Main Screen").clicked() {
                        self.current_screen = AppScreen::Main;
                        self.study_session = None;
                    }
                } else if let Some(card) = session.current_card() {
                    // Clone values to avoid borrowing issues
                    let show_back = session.show_back;
                    let is_recalled = card.is_recalled;
                    let front = card.card.front.clone();
                    let back = card.card.back.clone();

                    ui.group(|ui| {
                        ui.set_min_height(200.0);
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);

                            ui.heading("Front:");
                            ui.label(&front);

                            ui.add_space(20.0);

                            if show_back {
                                ui.heading("Back:");
                                ui.label(&back);
                            } else {
                                ui.label("(Click 'Show Answer' to reveal)");
                            }

                            ui.add_space(20.0);
                        });
                    });

                    ui.add_space(20.0);

                    // Store actions to execute after UI rendering
                    let mut action_reveal = false;
                    let mut action_grade: Option<u8> = None;
                    let mut action_back = false;

                    if !show_back && ui.button("Show Answer").clicked() {
                        action_reveal = true;
                    }

                    // Quality rating buttons (1-5) - only shown after revealing the answer
                    if show_back && !is_recalled {
                        ui.label("How well did you recall it?");
                        ui.horizontal(|ui| {
                            if ui.button("1 - No recall").clicked() {
                                action_grade = Some(1);
                            }
                            if ui.button("2 - Wrong, but familiar").clicked() {
                                action_grade = Some(2);
                            }
                        });
                        ui.horizontal(|ui| {
                            if ui.button("3 - Recalled with effort").clicked() {
                                action_grade = Some(3);
                            }
                            if ui.button("4 - Correct").clicked() {
                                action_grade = Some(4);
                            }
                            if ui.button("5 - Instant").clicked() {
                                action_grade = Some(5);
                            }
                        });
                    }

                    ui.add_space(20.0);

                    if ui.button("Back to Main Screen").clicked() {
                        action_back = true;
                    }

                    // Execute deferred actions
                    if action_reveal {
                        session.toggle_back();
                    }
                    if let Some(quality) = action_grade {
                        match session.grade_current_card(quality) {
                            Ok(()) => session.next_card(),
                            Err(e) => grade_error = Some(format!("Failed to grade card: {e}")),
                        }
                    }
                    if action_back {
                        self.current_screen = AppScreen::Main;
                        self.study_session = None;
                    }
                }
            }
        });

        if let Some(message) = grade_error {
            self.show_status(message);
        }
    }

    /// Starts a study session with the cards due for review
    fn start_study_session(&mut self, deck_index: usize) {
        if let Some(deck) = self.all_decks.decks.get(deck_index) {
            if let Some(store) = &self.store {
                let store_guard = store.lock().unwrap();

                // Fetch only cards due at the current simulated date
                let due_cards = store_guard.due_cards(&deck.name).unwrap_or_default();

                drop(store_guard);

                if due_cards.is_empty() {
                    let name = deck.name.clone();
                    self.show_status(format!("No cards due in '{name}' today."));
                } else {
                    self.study_session = Some(StudySession::new_from_due_cards(
                        deck.name.clone(),
                        due_cards,
                        Arc::clone(store),
                    ));
                    self.current_screen = AppScreen::StudySession;
                }
            }
        }
    }

    /// Handles deck export to JSON file
    fn handle_export(&mut self, deck_index: usize) {
        let mut message: Option<String> = None;

        if let Some(deck) = self.all_decks.decks.get(deck_index) {
            // Open file save dialog
            if let Some(path) = rfd::FileDialog::new()
                .set_file_name(format!("{}.json", deck.name))
                .add_filter("JSON files", &["json"])
                .save_file()
            {
                message = Some(match export_json_to_path(deck, &path.to_string_lossy()) {
                    Ok(_) => format!("Deck '{}' exported successfully!", deck.name),
                    Err(e) => format!("Export failed: {e}"),
                });
            }
        }

        if let Some(message) = message {
            self.show_status(message);
        }
        self.show_export_dialog = false;
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        // Open file selection dialog
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let deck = match import_json(&path.to_string_lossy()) {
            Ok(deck) => deck,
            Err(e) => {
                self.show_status(format!(
                    "Import failed: {e}\n\nPlease check if the file has correct structure:\n{{\n  \"name\": \"Deck Name\",\n  \"cards\": [...]\n}}"
                ));
                return;
            }
        };

        // Check if deck with this name already exists
        if self.all_decks.decks.iter().any(|d| d.name == deck.name) {
            self.show_status(format!(
                "Deck '{}' already exists! Please rename it in the JSON file.",
                deck.name
            ));
            return;
        }

        // Add deck and cards to the store
        let mut store_failure: Option<String> = None;
        if let Some(store) = &self.store {
            let store_guard = store.lock().unwrap();

            if let Err(e) = store_guard.add_deck(&deck.name) {
                store_failure = Some(format!("Failed to create deck: {e}"));
            } else {
                for card in &deck.cards {
                    if let Err(e) = store_guard.add_card(&deck.name, &card.front, &card.back) {
                        store_failure =
                            Some(format!("Failed to import card '{}': {e}", card.front));
                        break;
                    }
                }
            }
        }
        if let Some(message) = store_failure {
            self.show_status(message);
            return;
        }

        // Add to in-memory DeckSet
        let name = deck.name.clone();
        let count = deck.cards.len();
        self.all_decks.decks.push(deck);

        self.show_status(format!(
            "Deck '{name}' imported successfully with {count} cards!"
        ));
    }
}
