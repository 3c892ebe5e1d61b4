use std::time::Duration;

use url::Url;

use super::*;
use crate::client::memory::MemorySurface;
use crate::client::surface::{Capabilities, CssRule, Engine, MediaText, RuleAccess, SheetProbe};

fn surface() -> MemorySurface {
    let mut surface = MemorySurface::new(Url::parse("http://localhost:8080/index.html").unwrap());
    surface.set_now(1000);
    surface
}

fn polled(engine: Engine) -> MemorySurface {
    surface().with_capabilities(Capabilities {
        native_load_event: false,
        engine,
    })
}

fn native() -> Actuator {
    Actuator::new(LoadDetection::NativeEvent, None)
}

// ============================================================================
// Styles
// ============================================================================

#[test]
fn test_css_change_swaps_link_without_reload() {
    let mut surface = surface();
    let (main, _) = surface.add_link("/src/css/main.css", Vec::new());
    surface.add_link("/src/css/print.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = native();

    let outcome = actuator.reload_css(&mut surface, &log, "src/css/main.css");
    assert_eq!(outcome, Outcome::Styles { links: 1, imports: 0 });
    assert_eq!(surface.reload_count(), 0);

    // Original stays until the clone has loaded
    let clone = actuator.pending()[0].clone;
    assert!(surface.is_attached(main));
    assert_eq!(
        surface.link_hrefs(),
        [
            "http://localhost:8080/src/css/main.css",
            "http://localhost:8080/src/css/main.css?watchreload=1000",
            "http://localhost:8080/src/css/print.css",
        ]
    );

    assert!(actuator.on_style_load(&mut surface, &log, clone));
    assert_eq!(surface.removed(), [main]);
    assert_eq!(
        surface.link_hrefs(),
        [
            "http://localhost:8080/src/css/main.css?watchreload=1000",
            "http://localhost:8080/src/css/print.css",
        ]
    );
    assert!(actuator.pending().is_empty());
}

#[test]
fn test_every_full_match_is_swapped() {
    let mut surface = surface();
    surface.add_link("/a/theme.css", Vec::new());
    surface.add_link("/b/theme.css", Vec::new());
    let mut actuator = native();

    let outcome = actuator.reload_css(&mut surface, &ClientLog::default(), "theme.css");
    assert_eq!(outcome, Outcome::Styles { links: 2, imports: 0 });
    assert_eq!(actuator.pending().len(), 2);
}

#[test]
fn test_repeated_load_signal_removes_once() {
    let mut surface = surface();
    let (main, _) = surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = native();

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;

    assert!(actuator.on_style_load(&mut surface, &log, clone));
    assert!(!actuator.on_style_load(&mut surface, &log, clone));
    assert!(!actuator.on_style_error(&mut surface, &log, clone));
    assert_eq!(surface.removed(), [main]);
}

#[test]
fn test_change_during_swap_leaves_no_stray_clones() {
    let mut surface = surface();
    let (main, _) = surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = native();

    actuator.reload_css(&mut surface, &log, "main.css");
    let first = actuator.pending()[0].clone;

    // The reloading original is out of the pool, only the clone is swapped
    surface.set_now(2000);
    let outcome = actuator.reload_css(&mut surface, &log, "main.css");
    assert_eq!(outcome, Outcome::Styles { links: 1, imports: 0 });
    let second = actuator.pending()[1].clone;
    assert_eq!(actuator.pending()[1].original, first);

    assert!(actuator.on_style_load(&mut surface, &log, second));
    assert_eq!(surface.removed(), [first, main]);
    assert_eq!(surface.link_hrefs(), ["http://localhost:8080/main.css?watchreload=2000"]);
    assert!(actuator.pending().is_empty());

    // Late signal of the first clone changes nothing
    assert!(!actuator.on_style_load(&mut surface, &log, first));
    assert_eq!(surface.removed().len(), 2);
}

#[test]
fn test_load_error_completes_swap_with_warning() {
    let mut surface = surface();
    let (main, _) = surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = native();

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;

    assert!(actuator.on_style_error(&mut surface, &log, clone));
    assert_eq!(surface.removed(), [main]);
    assert!(
        surface
            .console_lines()
            .iter()
            .any(|(_, line)| line.starts_with("[watchreload-warn]"))
    );
}

#[test]
fn test_import_is_rewritten_in_place() {
    let mut surface = surface();
    let sheet = surface.add_style_element(vec![
        CssRule::Import {
            href: "url(css/theme.css) screen".into(),
            media: MediaText::Text("screen".into()),
            sheet: None,
        },
        CssRule::Style {
            declarations: vec![("color".into(), "red".into())],
        },
    ]);
    let mut actuator = native();

    let outcome = actuator.reload_css(&mut surface, &ClientLog::default(), "css/theme.css");
    assert_eq!(outcome, Outcome::Styles { links: 0, imports: 1 });
    assert_eq!(surface.reload_count(), 0);

    let rules = surface.rules(sheet);
    assert_eq!(rules.len(), 2);
    let CssRule::Import { href, media, .. } = &rules[0] else {
        panic!("expected import, got {:?}", rules[0]);
    };
    assert_eq!(href, "http://localhost:8080/css/theme.css?watchreload=1000");
    assert_eq!(media, &MediaText::Text("screen".into()));
    assert!(actuator.pending().is_empty());
}

#[test]
fn test_no_stylesheet_match_reloads_page() {
    let mut surface = surface();
    surface.add_link("main.css", Vec::new());
    let mut actuator = native();

    let outcome = actuator.reload_css(&mut surface, &ClientLog::default(), "other.css");
    assert_eq!(outcome, Outcome::PageReload);
    assert_eq!(surface.reload_count(), 1);
    assert!(surface.removed().is_empty());
}

#[test]
fn test_cross_origin_sheets_do_not_block_reload() {
    let mut surface = surface();
    let (_, cdn) = surface.add_link("https://cdn.example.com/lib.css", vec![CssRule::Other]);
    surface.set_cross_origin(cdn);
    surface.add_link("main.css", Vec::new());
    let mut actuator = native();

    let outcome = actuator.reload_css(&mut surface, &ClientLog::default(), "main.css");
    assert_eq!(outcome, Outcome::Styles { links: 1, imports: 0 });
}

// ============================================================================
// Polling
// ============================================================================

#[test]
fn test_polling_waits_for_readable_rules() {
    let mut surface = polled(Engine::Gecko);
    let (main, _) = surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(LoadDetection::select(surface.capabilities()), None);

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;

    assert_eq!(actuator.tick(&mut surface, &log), 0);
    surface.set_probe(clone, SheetProbe::Present(RuleAccess::NotReady));
    assert_eq!(actuator.tick(&mut surface, &log), 0);
    assert!(surface.is_attached(main));

    surface.finish_load(clone);
    assert_eq!(actuator.tick(&mut surface, &log), 1);
    assert_eq!(surface.removed(), [main]);
    assert_eq!(actuator.tick(&mut surface, &log), 0);
}

#[test]
fn test_polling_security_error_counts_as_loaded() {
    let mut surface = polled(Engine::Other);
    surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(LoadDetection::select(surface.capabilities()), None);

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;
    surface.set_probe(clone, SheetProbe::Present(RuleAccess::SecurityError));
    assert_eq!(actuator.tick(&mut surface, &log), 1);
}

#[test]
fn test_polling_webkit_null_sheet_counts_as_loaded() {
    let mut surface = polled(Engine::Webkit);
    surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(LoadDetection::select(surface.capabilities()), None);

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;
    surface.set_probe(clone, SheetProbe::Null);
    assert_eq!(actuator.tick(&mut surface, &log), 1);
}

#[test]
fn test_polling_without_timeout_waits_forever() {
    let mut surface = polled(Engine::Gecko);
    surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(LoadDetection::select(surface.capabilities()), None);

    actuator.reload_css(&mut surface, &log, "main.css");
    surface.set_now(u64::MAX / 2);
    assert_eq!(actuator.tick(&mut surface, &log), 0);
    assert_eq!(actuator.pending().len(), 1);
}

#[test]
fn test_poll_timeout_assumes_loaded() {
    let mut surface = polled(Engine::Gecko);
    let (main, _) = surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(
        LoadDetection::select(surface.capabilities()),
        Some(Duration::from_millis(500)),
    );

    actuator.reload_css(&mut surface, &log, "main.css");
    surface.set_now(1499);
    assert_eq!(actuator.tick(&mut surface, &log), 0);
    surface.set_now(1500);
    assert_eq!(actuator.tick(&mut surface, &log), 1);
    assert_eq!(surface.removed(), [main]);
}

#[test]
fn test_load_event_switches_polling_to_native() {
    let mut surface = polled(Engine::Gecko);
    let (main, _) = surface.add_link("main.css", Vec::new());
    let (theme, _) = surface.add_link("theme.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = Actuator::new(LoadDetection::select(surface.capabilities()), None);

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;
    assert!(actuator.on_style_load(&mut surface, &log, clone));
    assert_eq!(actuator.detection(), LoadDetection::NativeEvent);
    assert_eq!(surface.removed(), [main]);

    // Later swaps wait for the event instead of polling
    actuator.reload_css(&mut surface, &log, "theme.css");
    let next = actuator.pending()[0].clone;
    surface.finish_load(next);
    assert_eq!(actuator.tick(&mut surface, &log), 0);
    assert!(surface.is_attached(theme));
}

#[test]
fn test_native_detection_ignores_ticks() {
    let mut surface = surface();
    surface.add_link("main.css", Vec::new());
    let log = ClientLog::default();
    let mut actuator = native();

    actuator.reload_css(&mut surface, &log, "main.css");
    let clone = actuator.pending()[0].clone;
    surface.finish_load(clone);
    assert_eq!(actuator.tick(&mut surface, &log), 0);
    assert_eq!(actuator.pending().len(), 1);
}

// ============================================================================
// Images
// ============================================================================

#[test]
fn test_image_reloaded_through_inline_style_only() {
    let mut surface = surface();
    let other = surface.add_image("img/other.png");
    let hero = surface.add_styled(&[("background-image", "url('/img/logo.png')")]);
    surface.add_link("main.css", Vec::new());
    let mut actuator = native();

    let outcome = actuator.reload_image(&mut surface, &ClientLog::default(), "img/logo.png");
    assert_eq!(outcome, Outcome::Images(1));
    assert_eq!(surface.reload_count(), 0);
    assert_eq!(
        surface.inline_style(hero, "background-image").unwrap(),
        "url('http://localhost:8080/img/logo.png?watchreload=1000')"
    );
    assert_eq!(surface.image_src(other), Some("http://localhost:8080/img/other.png"));
}

#[test]
fn test_image_passes_share_one_timestamp() {
    let mut surface = surface();
    let img = surface.add_image("img/logo.png");
    let styled = surface.add_styled(&[("border-image", "url(img/logo.png) 30 round")]);
    let sheet = surface.add_style_element(vec![CssRule::Style {
        declarations: vec![("background-image".into(), "url(img/logo.png)".into())],
    }]);
    let mut actuator = native();

    let outcome = actuator.reload_image(&mut surface, &ClientLog::default(), "img/logo.png");
    assert_eq!(outcome, Outcome::Images(3));

    let busted = "http://localhost:8080/img/logo.png?watchreload=1000";
    assert_eq!(surface.image_src(img), Some(busted));
    assert!(surface.inline_style(styled, "border-image").unwrap().contains(busted));
    assert!(
        surface.rules(sheet)[0]
            .property("background-image")
            .unwrap()
            .contains(busted)
    );
}

#[test]
fn test_no_image_match_reloads_page() {
    let mut surface = surface();
    surface.add_image("img/logo.png");
    let mut actuator = native();

    let outcome = actuator.reload_image(&mut surface, &ClientLog::default(), "img/missing.png");
    assert_eq!(outcome, Outcome::PageReload);
    assert_eq!(surface.reload_count(), 1);
}

#[test]
fn test_partial_image_match_is_not_reloaded() {
    let mut surface = surface();
    let img = surface.add_image("assets/logo.png");
    let mut actuator = native();

    let outcome = actuator.reload_image(&mut surface, &ClientLog::default(), "img/logo.png");
    assert_eq!(outcome, Outcome::PageReload);
    assert_eq!(surface.image_src(img), Some("http://localhost:8080/assets/logo.png"));
}
