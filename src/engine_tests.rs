//! Unit tests for the pricing session.

use super::*;
use crate::catalog::SetListing;
use crate::models::CatalogEntry;
use crate::parser::MAX_LINE_QUANTITY;
use crate::pricing::FallbackReason;

fn printing(name: &str, id: u64, low: &str, mid: &str, market: &str) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        set: String::new(),
        rarity: Some("Ordinary".to_string()),
        product_id: Some(id),
        low: Some(low.to_string()),
        mid: Some(mid.to_string()),
        high: None,
        market: Some(market.to_string()),
        is_foil: false,
    }
}

/// Alpha/Beta/Gamma catalog:
/// - Bladedancer: non-foil in Alpha and Beta, foil in Beta
/// - Summoning Sphere: non-foil in Gamma only, market untracked
/// - Pathfinder: non-foil in Alpha, foil in Beta and Gamma
fn catalog() -> Catalog {
    Catalog::from_sets(vec![
        SetListing::new(
            "Alpha",
            vec![
                printing("Bladedancer", 1, "2.00", "2.50", "3.00"),
                printing("Pathfinder", 2, "20.00", "25.00", "30.00"),
            ],
            vec![],
        ),
        SetListing::new(
            "Beta",
            vec![printing("Bladedancer", 3, "1.00", "1.25", "1.50")],
            vec![
                printing("Bladedancer (Foil)", 4, "8.00", "9.00", "10.00"),
                printing("Pathfinder (Foil)", 5, "40.00", "45.00", "50.00"),
            ],
        ),
        SetListing::new(
            "Gamma",
            vec![printing("Summoning Sphere", 6, "3.50", "0", "0.00")],
            vec![printing("Pathfinder (Foil)", 7, "60.00", "65.00", "70.00")],
        ),
    ])
}

fn config() -> PricerConfig {
    PricerConfig {
        recency_order: Some(vec!["Alpha".into(), "Beta".into(), "Gamma".into()]),
        header_dialect: None,
        prefer_foil: false,
        price_tier: PriceTier::Market,
    }
}

fn pricer() -> DeckPricer {
    DeckPricer::new(catalog(), &config()).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

mod calculate_tests {
    use super::*;

    #[test]
    fn prices_mixed_dialect_list() {
        let mut pricer = pricer();
        let result = pricer.calculate("1 Bladedancer\n2x Summoning Sphere").unwrap();

        assert_eq!(result.total_cards, 3);
        assert_eq!(result.rows.len(), 2);
        assert!(result.not_found_names.is_empty());

        // Bladedancer: most recent non-foil set is Beta
        let blade = &result.rows[0];
        assert_eq!(blade.selected_set, "Beta");
        assert!(!blade.is_foil);
        assert!(approx(blade.unit_price, 1.5));
        assert!(blade.has_non_foil && blade.has_foil && blade.has_both_in_any_set);

        // Summoning Sphere: market untracked, low used
        let sphere = &result.rows[1];
        assert!(approx(sphere.unit_price, 3.5));
        assert!(approx(sphere.line_total, 7.0));
        assert_eq!(sphere.fallback, Some(FallbackReason::MarketUntracked));
        assert!(sphere.using_fallback());

        assert!(approx(result.total_price, 8.5));
    }

    #[test]
    fn unknown_cards_are_collected() {
        let mut pricer = pricer();
        let result = pricer.calculate("1 Nonexistent Card").unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.not_found_names, vec!["Nonexistent Card".to_string()]);
        assert_eq!(result.total_cards, 0);
        assert_eq!(
            result.not_found_message().as_deref(),
            Some("Could not find 1 card(s): Nonexistent Card")
        );
    }

    #[test]
    fn rows_follow_first_seen_order_after_merging() {
        let mut pricer = pricer();
        let result = pricer
            .calculate("1 Pathfinder\n1 Bladedancer\n2 Pathfinder")
            .unwrap();
        let names: Vec<&str> = result.rows.iter().map(|r| r.card_name.as_str()).collect();
        assert_eq!(names, vec!["Pathfinder", "Bladedancer"]);
        assert_eq!(result.rows[0].quantity, 3);
    }

    #[test]
    fn preferred_variant_decides_the_set() {
        let mut pricer = pricer();
        let result = pricer.calculate("1 Pathfinder").unwrap();
        assert_eq!(result.rows[0].selected_set, "Alpha");
        assert!(!result.rows[0].is_foil);

        pricer.clear();
        pricer.set_prefer_foil(true);
        let result = pricer.calculate("1 Pathfinder").unwrap();
        assert_eq!(result.rows[0].selected_set, "Gamma");
        assert!(result.rows[0].is_foil);
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let mut pricer = pricer();
        let result = pricer.calculate("").unwrap();
        assert_eq!(result, &CalculationResult::default());
    }

    #[test]
    fn header_input_must_be_formatted_first() {
        let mut pricer = DeckPricer::new(catalog(), &PricerConfig::sorcery()).unwrap();
        let text = "Avatar\nSpellbook (3)\n1Bladedancer\n2Pathfinder";

        assert!(pricer.needs_formatting(text));
        assert_eq!(pricer.calculate(text).unwrap_err(), EngineError::UnformattedInput);
        assert!(pricer.result().is_none());

        let formatted = pricer.format_input(text);
        assert_eq!(formatted, "1 Bladedancer\n2 Pathfinder");
        assert!(!pricer.needs_formatting(&formatted));
        assert_eq!(pricer.calculate(&formatted).unwrap().total_cards, 3);
    }

    #[test]
    fn format_input_merges_plain_lists_too() {
        let pricer = pricer();
        assert_eq!(pricer.format_input("1 Foo\njunk\n2x Foo"), "3 Foo");
    }

    #[test]
    fn sum_of_row_quantities_is_total_cards() {
        let mut pricer = pricer();
        let result = pricer
            .calculate("3 Bladedancer\n2 Pathfinder\n4 Summoning Sphere\n1 Missing")
            .unwrap();
        let sum: u64 = result.rows.iter().map(|r| u64::from(r.quantity)).sum();
        assert_eq!(sum, result.total_cards);
        assert_eq!(result.total_cards, 9);
    }

    #[test]
    fn oversized_quantities_are_skipped_not_summed() {
        let mut pricer = pricer();
        let result = pricer
            .calculate("4000000000 Bladedancer\n4000000000 Pathfinder\n2 Summoning Sphere")
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.total_cards, 2);
        assert!(result.not_found_names.is_empty());
    }

    #[test]
    fn large_lines_sum_into_total_cards() {
        let mut pricer = pricer();
        let text = format!("{MAX_LINE_QUANTITY} Bladedancer\n{MAX_LINE_QUANTITY} Pathfinder");
        let result = pricer.calculate(&text).unwrap();
        assert_eq!(result.total_cards, 2 * u64::from(MAX_LINE_QUANTITY));
    }
}

mod reprice_tests {
    use super::*;

    #[test]
    fn recompute_is_idempotent() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer\n1 Summoning Sphere").unwrap();

        let first = pricer.recompute().unwrap().clone();
        let second = pricer.recompute().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn recompute_before_calculate_fails() {
        let mut pricer = pricer();
        assert_eq!(pricer.recompute().unwrap_err(), EngineError::NoCalculation);
    }

    #[test]
    fn price_tier_change_keeps_selections() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer").unwrap();
        let key = SelectionKey::aggregate("Bladedancer");
        pricer.select_set(&key, "Alpha").unwrap();

        let result = pricer.set_price_tier(PriceTier::Low).unwrap();
        assert_eq!(result.rows[0].selected_set, "Alpha");
        assert!(approx(result.rows[0].unit_price, 2.0));
        assert!(approx(result.total_price, 4.0));

        let result = pricer.set_price_tier(PriceTier::Mid).unwrap();
        assert!(approx(result.rows[0].unit_price, 2.5));
        assert_eq!(pricer.price_tier(), PriceTier::Mid);
    }

    #[test]
    fn mid_tier_falls_back_when_zero() {
        let mut pricer = pricer();
        pricer.calculate("1 Summoning Sphere").unwrap();
        let result = pricer.set_price_tier(PriceTier::Mid).unwrap();
        assert_eq!(result.rows[0].fallback, Some(FallbackReason::MidUnavailable));
        assert!(approx(result.rows[0].unit_price, 3.5));
    }

    #[test]
    fn select_set_flips_to_available_variant() {
        let mut pricer = pricer();
        pricer.calculate("1 Pathfinder").unwrap();
        let key = SelectionKey::aggregate("Pathfinder");

        let result = pricer.select_set(&key, "Beta").unwrap();
        assert_eq!(result.rows[0].selected_set, "Beta");
        assert!(result.rows[0].is_foil);
        assert!(approx(result.rows[0].unit_price, 50.0));
        assert!(!result.rows[0].has_non_foil);
        assert!(result.rows[0].has_foil);
    }

    #[test]
    fn select_foil_switches_variant() {
        let mut pricer = pricer();
        pricer.calculate("1 Bladedancer").unwrap();
        let key = SelectionKey::aggregate("Bladedancer");

        let result = pricer.select_foil(&key, true).unwrap();
        assert!(result.rows[0].is_foil);
        assert!(approx(result.rows[0].unit_price, 10.0));
        assert_eq!(result.rows[0].product_id, Some(4));
    }

    #[test]
    fn edits_report_command_errors() {
        let mut pricer = pricer();
        let key = SelectionKey::aggregate("Bladedancer");
        assert_eq!(pricer.select_set(&key, "Alpha").unwrap_err(), EngineError::NoCalculation);

        pricer.calculate("1 Bladedancer").unwrap();
        assert_eq!(
            pricer.select_set(&key, "Gamma").unwrap_err(),
            EngineError::SetNotAvailable {
                card: "Bladedancer".into(),
                set: "Gamma".into()
            }
        );
        let missing = SelectionKey::aggregate("Pathfinder");
        assert_eq!(
            pricer.select_set(&missing, "Alpha").unwrap_err(),
            EngineError::UnknownRow(missing.clone())
        );
        pricer.select_set(&key, "Alpha").unwrap();
        assert!(matches!(
            pricer.select_foil(&key, true),
            Err(EngineError::VariantUnavailable { .. })
        ));
        // Failed edits leave the last result in place
        assert_eq!(pricer.result().unwrap().rows[0].selected_set, "Alpha");
    }

    #[test]
    fn failed_reprice_keeps_previous_selections() {
        let mut pricer = pricer();
        pricer.calculate("1 Bladedancer\n1 Pathfinder").unwrap();
        let before = pricer.result().unwrap().clone();

        // Pathfinder is priced from Alpha; once Alpha is gone every reprice fails
        pricer.lines[1].matched.sets.retain(|set| set.set != "Alpha");

        let key = SelectionKey::aggregate("Bladedancer");
        assert!(matches!(
            pricer.select_set(&key, "Alpha"),
            Err(EngineError::Internal(_))
        ));
        assert_eq!(pricer.selection(&key).unwrap().set, "Beta");

        assert!(matches!(
            pricer.select_foil(&key, true),
            Err(EngineError::Internal(_))
        ));
        assert!(!pricer.selection(&key).unwrap().is_foil);
        assert_eq!(pricer.result().unwrap(), &before);
    }

    #[test]
    fn selections_survive_recalculation() {
        let mut pricer = pricer();
        pricer.calculate("1 Bladedancer").unwrap();
        pricer
            .select_set(&SelectionKey::aggregate("Bladedancer"), "Alpha")
            .unwrap();

        let result = pricer.calculate("3 Bladedancer\n1 Pathfinder").unwrap();
        assert_eq!(result.rows[0].selected_set, "Alpha");
        assert_eq!(result.rows[0].quantity, 3);
    }
}

mod split_tests {
    use super::*;

    #[test]
    fn split_expands_into_single_copies() {
        let mut pricer = pricer();
        pricer.calculate("3 Bladedancer\n1 Pathfinder").unwrap();

        let result = pricer.split("Bladedancer").unwrap();
        assert_eq!(result.rows.len(), 4);
        let units: Vec<&RowDetail> = result.rows.iter().filter(|r| r.is_split()).collect();
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|r| r.quantity == 1));
        assert_eq!(
            units.iter().map(|r| r.split_index()).collect::<Vec<_>>(),
            vec![Some(0), Some(1), Some(2)]
        );
        assert_eq!(units.iter().map(|r| r.quantity).sum::<u32>(), 3);
        assert_eq!(result.total_cards, 4);
        assert!(pricer.is_split("Bladedancer"));
    }

    #[test]
    fn split_units_are_seeded_by_default_policy() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer").unwrap();
        pricer
            .select_set(&SelectionKey::aggregate("Bladedancer"), "Alpha")
            .unwrap();

        let result = pricer.split("Bladedancer").unwrap();
        // Not copied from the aggregate, which was moved to Alpha
        assert!(result.rows.iter().all(|r| r.selected_set == "Beta"));
    }

    #[test]
    fn split_units_are_independently_selectable() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer").unwrap();
        pricer.split("Bladedancer").unwrap();

        let result = pricer
            .select_foil(&SelectionKey::unit("Bladedancer", 1), true)
            .unwrap();
        assert!(!result.rows[0].is_foil);
        assert!(result.rows[1].is_foil);
        assert!(approx(result.total_price, 1.5 + 10.0));

        // The aggregate key no longer addresses a row
        let aggregate = SelectionKey::aggregate("Bladedancer");
        assert_eq!(
            pricer.select_set(&aggregate, "Alpha").unwrap_err(),
            EngineError::UnknownRow(aggregate.clone())
        );
        let out_of_range = SelectionKey::unit("Bladedancer", 2);
        assert_eq!(
            pricer.select_set(&out_of_range, "Alpha").unwrap_err(),
            EngineError::UnknownRow(out_of_range.clone())
        );
    }

    #[test]
    fn split_then_unsplit_restores_line_total() {
        let mut pricer = pricer();
        pricer.calculate("3 Bladedancer").unwrap();
        pricer
            .select_set(&SelectionKey::aggregate("Bladedancer"), "Alpha")
            .unwrap();
        let before = pricer.result().unwrap().clone();

        pricer.split("Bladedancer").unwrap();
        pricer
            .select_foil(&SelectionKey::unit("Bladedancer", 0), false)
            .unwrap();
        let after = pricer.unsplit("Bladedancer").unwrap();

        assert_eq!(after.rows.len(), 1);
        assert_eq!(after.rows[0].line_total, before.rows[0].line_total);
        assert_eq!(after, &before);
        assert!(pricer.selection(&SelectionKey::unit("Bladedancer", 0)).is_none());
    }

    #[test]
    fn split_requires_a_known_line() {
        let mut pricer = pricer();
        assert_eq!(
            pricer.split("Bladedancer").unwrap_err(),
            EngineError::UnknownCard("Bladedancer".into())
        );
        pricer.calculate("1 Bladedancer").unwrap();
        assert_eq!(
            pricer.unsplit("Bladedancer").unwrap_err(),
            EngineError::NotSplit("Bladedancer".into())
        );
    }

    #[test]
    fn split_survives_quantity_change() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer").unwrap();
        pricer.split("Bladedancer").unwrap();

        let result = pricer.calculate("4 Bladedancer").unwrap();
        assert_eq!(result.rows.len(), 4);
        assert!(result.rows.iter().all(|r| r.is_split()));
    }

    #[test]
    fn clear_resets_session() {
        let mut pricer = pricer();
        pricer.calculate("2 Bladedancer").unwrap();
        pricer.split("Bladedancer").unwrap();

        pricer.clear();
        assert!(pricer.result().is_none());
        assert!(!pricer.is_split("Bladedancer"));
        assert!(pricer.selection(&SelectionKey::unit("Bladedancer", 0)).is_none());
        assert_eq!(pricer.recompute().unwrap_err(), EngineError::NoCalculation);
    }
}
