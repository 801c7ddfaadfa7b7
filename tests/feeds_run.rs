use chrono::NaiveDate;
use promo_watch::clock::FixedClock;
use promo_watch::decision::ReasonKind;
use promo_watch::engine::{evaluate_all, promotional_partners};
use promo_watch::feed::{EsferaProvider, FeedProvider, LiveloProvider};
use promo_watch::model::{Program, WatchCriteria, WatchList};
use promo_watch::notify::Report;
use promo_watch::FeedError;
use rust_decimal::Decimal;

const LIVELO_JSON: &str = include_str!("fixtures/livelo_campaigns.json");
const ESFERA_JSON: &str = include_str!("fixtures/esfera_products.json");

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn livelo_watch() -> WatchList {
    [
        WatchCriteria::new("CEN", "Centauro", Decimal::from(5))
            .with_categories(["tênis"])
            .with_max_amount(Decimal::from(300)),
        WatchCriteria::new("AMZ", "Amazon", Decimal::from(3)),
        WatchCriteria::new("BOK", "Livraria", Decimal::from(2)),
        WatchCriteria::new("NOPE", "Not in feed", Decimal::ONE),
    ]
    .into_iter()
    .collect()
}

#[tokio::test]
async fn livelo_fixture_run() {
    let provider = LiveloProvider::from_fixture_str(LIVELO_JSON);
    assert_eq!(provider.program(), Program::Livelo);
    let watch = livelo_watch();

    let offers = provider.fetch_offers(&watch).await.expect("livelo parse ok");
    assert_eq!(offers.len(), 4, "record without partnerCode is skipped");

    let out = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 5, 10)));
    assert_eq!(out.decisions.len(), 3);
    assert_eq!(out.unwatched, 1);
    assert!(out.skipped.is_empty());

    let matched: Vec<_> = out.matches().collect();
    assert_eq!(matched.len(), 1);
    let cen = matched[0];
    assert_eq!(cen.partner, "CEN");
    assert_eq!(
        cen.url.as_deref(),
        Some("https://www.livelo.com.br/ganhe-pontos-compre-pontue-centauro")
    );
    let w = cen.window.expect("window");
    assert_eq!((w.start, w.end), (ymd(2024, 5, 10), ymd(2024, 5, 12)));

    let rejection = |code: &str| {
        out.decisions
            .iter()
            .find(|d| d.partner == code)
            .and_then(|d| d.rejection())
            .map(|r| r.kind)
    };
    assert_eq!(rejection("AMZ"), Some(ReasonKind::SelectedProducts));
    assert_eq!(rejection("BOK"), Some(ReasonKind::Parity));

    let report = Report::compose(Program::Livelo, ymd(2024, 5, 10), &matched);
    assert_eq!(report.rows, 1);
    assert!(report.html.contains("<strong>Centauro</strong>"));
}

#[tokio::test]
async fn livelo_notifies_only_on_boundary_days() {
    let provider = LiveloProvider::from_fixture_str(LIVELO_JSON);
    let watch = livelo_watch();
    let offers = provider.fetch_offers(&watch).await.unwrap();

    let mid = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 5, 11)));
    assert_eq!(mid.matches().count(), 0);
    let cen = mid.decisions.iter().find(|d| d.partner == "CEN").unwrap();
    assert_eq!(cen.rejection().unwrap().kind, ReasonKind::Timeliness);

    let end = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 5, 12)));
    assert_eq!(end.matches().count(), 1);
}

#[tokio::test]
async fn livelo_purchase_ceiling_applies() {
    let provider = LiveloProvider::from_fixture_str(LIVELO_JSON);
    let watch: WatchList = [WatchCriteria::new("CEN", "Centauro", Decimal::from(5))
        .with_max_amount(Decimal::from(100))]
    .into_iter()
    .collect();
    let offers = provider.fetch_offers(&watch).await.unwrap();
    let out = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 5, 10)));
    assert_eq!(
        out.decisions[0].rejection().map(|r| r.kind),
        Some(ReasonKind::MinimumPurchase)
    );
}

#[tokio::test]
async fn esfera_fixture_run() {
    let provider = EsferaProvider::from_fixture_str(ESFERA_JSON);
    let watch: WatchList = [
        WatchCriteria::new("renner", "Renner", Decimal::from(5)).with_categories(["feminina"]),
        WatchCriteria::new("centauro", "Centauro", Decimal::from(4)),
    ]
    .into_iter()
    .collect();

    let offers = provider.fetch_offers(&watch).await.expect("esfera parse ok");
    assert_eq!(offers.len(), 3);

    let out = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 5, 10)));
    assert_eq!(out.unwatched, 1);
    let matched: Vec<_> = out.matches().collect();
    assert_eq!(matched.len(), 1);
    let renner = matched[0];
    assert_eq!(renner.url.as_deref(), Some("https://www.esfera.com.vc/p/renner/esf02163"));
    assert!(renner.legal_terms.as_deref().unwrap().starts_with("<p>"));
    let w = renner.window.expect("window");
    assert_eq!((w.start, w.end), (ymd(2024, 5, 9), ymd(2024, 5, 10)));

    let centauro = out.decisions.iter().find(|d| d.partner == "centauro").unwrap();
    assert_eq!(centauro.rejection().unwrap().kind, ReasonKind::Parity);
}

#[test]
fn promotional_partners_from_feed() {
    let offers = LiveloProvider::parse_feed(LIVELO_JSON).unwrap();
    let found: Vec<&str> = promotional_partners(&offers, Decimal::from(6), None)
        .into_iter()
        .map(|o| o.code.as_str())
        .collect();
    assert_eq!(found, vec!["CEN", "MGZ"]);

    let watch = livelo_watch();
    let found = promotional_partners(&offers, Decimal::from(6), Some(&watch));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].code, "CEN");
}

#[tokio::test]
async fn malformed_feeds_abort() {
    let watch = WatchList::default();

    let err = LiveloProvider::from_fixture_str(r#"{"items": []}"#)
        .fetch_offers(&watch)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FeedError>(),
        Some(FeedError::NotACollection(_))
    ));

    let err = EsferaProvider::from_fixture_str(r#"{"items": [{"seoUrlSlugDerived": "x"}]}"#)
        .fetch_offers(&watch)
        .await
        .unwrap_err();
    match err.downcast_ref::<FeedError>() {
        Some(FeedError::MissingFields(lines)) => assert_eq!(lines.len(), 2),
        other => panic!("unexpected {other:?}"),
    }
}
