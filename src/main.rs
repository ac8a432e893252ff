mod app;
use nursedeck_app::*;

use app::NurseDeckApp;
use database::store::CardStore;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let store = CardStore::open("nursedeck.sqlite3").expect("Failed to initialize card store");

    if store.is_empty().unwrap_or(true) {
        let _ = store.add_deck("Vital Signs");

        let _ = store.add_card("Vital Signs", "Normal adult resting heart rate", "60-100 bpm");
        let _ = store.add_card(
            "Vital Signs",
            "Normal adult respiratory rate",
            "12-20 breaths per minute",
        );
        let _ = store.add_card(
            "Vital Signs",
            "Normal adult oral temperature",
            "36.5-37.5 C (97.7-99.5 F)",
        );

        log::info!("sample deck created");
    }

    let deck_set = store.load_all_decks().expect("Failed to load decks from store");

    log::info!("loaded {} decks from store", deck_set.decks.len());
    for deck in &deck_set.decks {
        log::info!("  - {} ({} cards)", deck.name, deck.cards.len());
    }
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "NurseDeck",
        options,
        Box::new(|_cc| Ok(Box::new(NurseDeckApp::new_with_deckset(deck_set, store)))),
    )
}
