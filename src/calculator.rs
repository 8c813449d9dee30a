//! Profitability calculator logic
//!
//! Every function here is pure: the same recipe, prices and multipliers
//! always produce the same numbers. Degenerate inputs (zero cost, zero
//! duration, zero input amount) resolve to 0 instead of NaN or infinity.

use std::fmt;

use serde::Serialize;

use crate::boost;
use crate::models::{
    BoostState, Multipliers, PerCraft, PerDay, Recipe, StartWithInput1, StartWithInput2,
};
use crate::prices::PriceTable;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Economics of a single craft
pub fn per_craft(recipe: &Recipe, prices: &PriceTable, mults: &Multipliers) -> PerCraft {
    let output_amount = recipe.output_per_craft * mults.output_mult;
    let input1_amount = recipe.input1.amount * mults.input_mult;
    let input2_amount = recipe.input2.as_ref().map_or(0.0, |i| i.amount) * mults.input_mult;

    let revenue = output_amount * prices.price(&recipe.output_symbol);
    let cost = input1_amount * prices.price(&recipe.input1.symbol)
        + recipe
            .input2
            .as_ref()
            .map_or(0.0, |i| input2_amount * prices.price(&i.symbol));

    let profit = revenue - cost;
    let roi = if cost > 0.0 { profit / cost } else { 0.0 };

    PerCraft {
        output_amount,
        input1_amount,
        input2_amount,
        revenue,
        cost,
        profit,
        roi,
    }
}

/// Effective craft time in seconds
pub fn effective_duration(recipe: &Recipe, mults: &Multipliers) -> f64 {
    recipe.duration_sec * mults.duration_mult
}

/// Economics of one building crafting around the clock
pub fn per_day(recipe: &Recipe, prices: &PriceTable, mults: &Multipliers) -> PerDay {
    let duration = effective_duration(recipe, mults);
    let crafts_per_day = if duration > 0.0 {
        SECONDS_PER_DAY / duration
    } else {
        0.0
    };
    let craft = per_craft(recipe, prices, mults);

    PerDay {
        crafts_per_day,
        output_per_day: craft.output_amount * crafts_per_day,
        revenue_per_day: craft.revenue * crafts_per_day,
        cost_per_day: craft.cost * crafts_per_day,
        profit_per_day: craft.profit * crafts_per_day,
        roi: craft.roi,
    }
}

// Whole crafts a stock covers. Negative or non-finite stock covers none.
fn crafts_from_stock(stock: f64, per_craft_amount: f64) -> u64 {
    if per_craft_amount <= 0.0
        || !per_craft_amount.is_finite()
        || !stock.is_finite()
        || stock <= 0.0
    {
        return 0;
    }
    (stock / per_craft_amount).floor() as u64
}

/// How far a stockpile of the first input goes
pub fn start_with_input1(recipe: &Recipe, stock: f64, mults: &Multipliers) -> StartWithInput1 {
    let in1 = recipe.input1.amount * mults.input_mult;
    let crafts = crafts_from_stock(stock, in1);
    let n = crafts as f64;

    StartWithInput1 {
        crafts,
        required_input2: recipe
            .input2
            .as_ref()
            .map_or(0.0, |i| n * i.amount * mults.input_mult),
        output: n * recipe.output_per_craft * mults.output_mult,
        time_sec: n * effective_duration(recipe, mults),
    }
}

/// How far a stockpile of the second input goes.
///
/// Single-input recipes yield an all-zero result.
pub fn start_with_input2(recipe: &Recipe, stock: f64, mults: &Multipliers) -> StartWithInput2 {
    let Some(input2) = recipe.input2.as_ref().filter(|i| i.amount != 0.0) else {
        return StartWithInput2::default();
    };
    let in1 = recipe.input1.amount * mults.input_mult;
    let in2 = input2.amount * mults.input_mult;
    let crafts = crafts_from_stock(stock, in2);
    let n = crafts as f64;

    StartWithInput2 {
        crafts,
        required_input1: n * in1,
        output: n * recipe.output_per_craft * mults.output_mult,
        time_sec: n * effective_duration(recipe, mults),
    }
}

/// Full evaluation of one recipe under one price table and boost state
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub recipe: Recipe,
    pub multipliers: Multipliers,
    pub per_craft: PerCraft,
    pub per_day: PerDay,
    pub start_input1_stock: f64,
    pub start_with_input1: StartWithInput1,
    pub start_input2_stock: f64,
    pub start_with_input2: StartWithInput2,
}

/// Resolve multipliers once and run every projection against them
pub fn evaluate(
    recipe: &Recipe,
    prices: &PriceTable,
    boost: &BoostState,
    start_input1: f64,
    start_input2: f64,
) -> Evaluation {
    let mults = boost::multipliers_for_recipe(recipe, boost);

    Evaluation {
        recipe: recipe.clone(),
        multipliers: mults,
        per_craft: per_craft(recipe, prices, &mults),
        per_day: per_day(recipe, prices, &mults),
        start_input1_stock: start_input1,
        start_with_input1: start_with_input1(recipe, start_input1, &mults),
        start_input2_stock: start_input2,
        start_with_input2: start_with_input2(recipe, start_input2, &mults),
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00:00".to_string();
    }
    let total = seconds.round() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.recipe;
        let m = &self.multipliers;

        writeln!(f, "=== {} ({}, level {}) ===", r.id, r.kind, r.level)?;
        write!(f, "Inputs: {} {}", r.input1.amount, r.input1.symbol)?;
        if let Some(in2) = &r.input2 {
            write!(f, " + {} {}", in2.amount, in2.symbol)?;
        }
        writeln!(
            f,
            " -> {} {} every {}",
            r.output_per_craft,
            r.output_symbol,
            format_duration(r.duration_sec)
        )?;
        writeln!(f)?;

        writeln!(f, "Multipliers:")?;
        writeln!(f, "  Duration: {:.4}", m.duration_mult)?;
        writeln!(f, "  Input:    {:.4}", m.input_mult)?;
        writeln!(f, "  Output:   {:.4}", m.output_mult)?;
        writeln!(f)?;

        let c = &self.per_craft;
        writeln!(f, "Per craft:")?;
        writeln!(f, "  Output:  {:.4} {}", c.output_amount, r.output_symbol)?;
        writeln!(f, "  Revenue: {:.4} COIN", c.revenue)?;
        writeln!(f, "  Cost:    {:.4} COIN", c.cost)?;
        writeln!(f, "  Profit:  {:.4} COIN", c.profit)?;
        writeln!(f, "  ROI:     {:.2}%", c.roi * 100.0)?;
        writeln!(f)?;

        let d = &self.per_day;
        writeln!(f, "Per day (24/7):")?;
        writeln!(f, "  Crafts:  {:.2}", d.crafts_per_day)?;
        writeln!(f, "  Output:  {:.4} {}", d.output_per_day, r.output_symbol)?;
        writeln!(f, "  Revenue: {:.4} COIN", d.revenue_per_day)?;
        writeln!(f, "  Cost:    {:.4} COIN", d.cost_per_day)?;
        writeln!(f, "  Profit:  {:.4} COIN", d.profit_per_day)?;
        writeln!(f)?;

        let s1 = &self.start_with_input1;
        writeln!(f, "Start with {} {}:", self.start_input1_stock, r.input1.symbol)?;
        writeln!(f, "  Crafts:  {}", s1.crafts)?;
        if let Some(in2) = &r.input2 {
            writeln!(f, "  Needs:   {:.4} {}", s1.required_input2, in2.symbol)?;
        }
        writeln!(f, "  Output:  {:.4} {}", s1.output, r.output_symbol)?;
        writeln!(f, "  Time:    {}", format_duration(s1.time_sec))?;

        if let Some(in2) = &r.input2 {
            let s2 = &self.start_with_input2;
            writeln!(f)?;
            writeln!(f, "Start with {} {}:", self.start_input2_stock, in2.symbol)?;
            writeln!(f, "  Crafts:  {}", s2.crafts)?;
            writeln!(f, "  Needs:   {:.4} {}", s2.required_input1, r.input1.symbol)?;
            writeln!(f, "  Output:  {:.4} {}", s2.output, r.output_symbol)?;
            writeln!(f, "  Time:    {}", format_duration(s2.time_sec))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, RecipeKind};

    fn wood_recipe() -> Recipe {
        Recipe {
            id: "WOOD_1".to_string(),
            kind: RecipeKind::Factory,
            output_symbol: "WOOD".to_string(),
            level: 1,
            duration_sec: 3600.0,
            output_per_craft: 10.0,
            input1: Ingredient::new("MUD", 5.0),
            input2: None,
            xp_per_craft: 3.0,
            upgrade_cost: None,
            event: None,
        }
    }

    fn two_input_recipe() -> Recipe {
        Recipe {
            id: "CERAMICS_2".to_string(),
            output_symbol: "CERAMICS".to_string(),
            output_per_craft: 4.0,
            duration_sec: 600.0,
            input1: Ingredient::new("CLAY", 10.0),
            input2: Some(Ingredient::new("HEAT", 2.0)),
            ..wood_recipe()
        }
    }

    fn prices() -> PriceTable {
        PriceTable::from_pairs([("WOOD", 2.0), ("MUD", 1.0)])
    }

    #[test]
    fn per_craft_reference_case() {
        let c = per_craft(&wood_recipe(), &prices(), &Multipliers::IDENTITY);
        assert_eq!(c.revenue, 20.0);
        assert_eq!(c.cost, 5.0);
        assert_eq!(c.profit, 15.0);
        assert_eq!(c.roi, 3.0);
        assert_eq!(c.input2_amount, 0.0);
    }

    #[test]
    fn per_day_reference_case() {
        let d = per_day(&wood_recipe(), &prices(), &Multipliers::IDENTITY);
        assert_eq!(d.crafts_per_day, 24.0);
        assert_eq!(d.profit_per_day, 360.0);
        assert_eq!(d.output_per_day, 240.0);
        assert_eq!(d.roi, 3.0);
    }

    #[test]
    fn halved_duration_doubles_throughput_only() {
        let fast = Multipliers {
            duration_mult: 0.5,
            ..Multipliers::IDENTITY
        };
        let d = per_day(&wood_recipe(), &prices(), &fast);
        assert_eq!(d.crafts_per_day, 48.0);
        assert_eq!(
            per_craft(&wood_recipe(), &prices(), &fast),
            per_craft(&wood_recipe(), &prices(), &Multipliers::IDENTITY)
        );
    }

    #[test]
    fn zero_cost_gives_zero_roi() {
        let free = PriceTable::from_pairs([("WOOD", 2.0)]);
        let c = per_craft(&wood_recipe(), &free, &Multipliers::IDENTITY);
        assert_eq!(c.cost, 0.0);
        assert_eq!(c.roi, 0.0);
        assert!(c.roi.is_finite());
    }

    #[test]
    fn negative_price_passes_through_roi() {
        let odd = PriceTable::from_pairs([("WOOD", -1.0), ("MUD", 1.0)]);
        let c = per_craft(&wood_recipe(), &odd, &Multipliers::IDENTITY);
        assert_eq!(c.profit, -15.0);
        assert_eq!(c.roi, -3.0);
    }

    #[test]
    fn missing_prices_zero_out() {
        let c = per_craft(&two_input_recipe(), &PriceTable::default(), &Multipliers::IDENTITY);
        assert_eq!((c.revenue, c.cost, c.profit, c.roi), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn second_input_adds_to_cost() {
        let table = PriceTable::from_pairs([("CERAMICS", 10.0), ("CLAY", 1.0), ("HEAT", 3.0)]);
        let mults = Multipliers {
            input_mult: 0.5,
            ..Multipliers::IDENTITY
        };
        let c = per_craft(&two_input_recipe(), &table, &mults);
        assert_eq!(c.input1_amount, 5.0);
        assert_eq!(c.input2_amount, 1.0);
        assert_eq!(c.cost, 5.0 + 3.0);
        assert_eq!(c.revenue, 40.0);
    }

    #[test]
    fn zero_duration_has_no_throughput() {
        let instant = Recipe {
            duration_sec: 0.0,
            ..wood_recipe()
        };
        let d = per_day(&instant, &prices(), &Multipliers::IDENTITY);
        assert_eq!(d.crafts_per_day, 0.0);
        assert_eq!(d.profit_per_day, 0.0);
        assert_eq!(d.roi, 3.0);
    }

    #[test]
    fn start_with_input1_floors_crafts() {
        let s = start_with_input1(&wood_recipe(), 12.0, &Multipliers::IDENTITY);
        assert_eq!(s.crafts, 2);
        assert_eq!(s.output, 20.0);
        assert_eq!(s.time_sec, 7200.0);
        assert_eq!(s.required_input2, 0.0);
    }

    #[test]
    fn start_with_input1_reports_second_input_need() {
        let s = start_with_input1(&two_input_recipe(), 35.0, &Multipliers::IDENTITY);
        assert_eq!(s.crafts, 3);
        assert_eq!(s.required_input2, 6.0);
    }

    #[test]
    fn start_with_input1_zero_amount_is_zero_crafts() {
        let free = Recipe {
            input1: Ingredient::new("MUD", 0.0),
            ..wood_recipe()
        };
        assert_eq!(start_with_input1(&free, 100.0, &Multipliers::IDENTITY).crafts, 0);
    }

    #[test]
    fn start_with_bad_stock_is_zero_crafts() {
        for stock in [-12.0, f64::NAN, f64::NEG_INFINITY] {
            assert_eq!(
                start_with_input1(&wood_recipe(), stock, &Multipliers::IDENTITY),
                StartWithInput1::default()
            );
        }
    }

    #[test]
    fn start_with_input2_single_input_is_all_zero() {
        for stock in [0.0, 12.0, 1e9] {
            assert_eq!(
                start_with_input2(&wood_recipe(), stock, &Multipliers::IDENTITY),
                StartWithInput2::default()
            );
        }
    }

    #[test]
    fn start_with_input2_mirrors_input1() {
        let mults = Multipliers {
            duration_mult: 0.5,
            ..Multipliers::IDENTITY
        };
        let s = start_with_input2(&two_input_recipe(), 7.0, &mults);
        assert_eq!(s.crafts, 3);
        assert_eq!(s.required_input1, 30.0);
        assert_eq!(s.output, 12.0);
        assert_eq!(s.time_sec, 900.0);
    }

    #[test]
    fn evaluate_shares_one_multiplier_triple() {
        let boost = BoostState::manual(100.0, 0.0);
        let e = evaluate(&wood_recipe(), &prices(), &boost, 12.0, 0.0);
        assert_eq!(e.multipliers.duration_mult, 0.5);
        assert_eq!(e.per_day.crafts_per_day, 48.0);
        assert_eq!(e.start_with_input1.time_sec, 3600.0);
        let report = e.to_string();
        assert!(report.contains("WOOD_1"));
        assert!(!report.contains("Start with 0 "));
    }

    #[test]
    fn format_duration_pads_fields() {
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(f64::NAN), "00:00:00");
    }
}
