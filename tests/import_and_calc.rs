use std::collections::BTreeMap;

use craftworld_calculator::account::{LevelSource, levels_from_json_str};
use craftworld_calculator::data::read_recipes;
use craftworld_calculator::db;
use craftworld_calculator::models::{BoostState, Multipliers, ProfileUpdate, RecipeKind};
use craftworld_calculator::{PriceTable, evaluate, multipliers_for_recipe};
use rusqlite::Connection;

const FACTORIES: &str = concat!(
    "ID,DURATION,OUTPUT,INPUT 1 SYMBOL,INPUT 1 AMOUNT,INPUT 2 SYMBOL,INPUT 2 AMOUNT,",
    "XP PER OUTPUT,COST SYMBOL,COST AMOUNT,EVENT\n",
    "MUD_1,01:00:00,10,EARTH,5,,,1,,,\n",
    "CERAMICS_1,00:10:00,4,CLAY,10,HEAT,2,3,COIN,\"1,500\",\n",
);

const PRICES: &str = r#"{"data":{"exchangePriceList":{"baseSymbol":"COIN","prices":[
    {"referenceSymbol":"MUD","amount":0.5},
    {"referenceSymbol":"EARTH","amount":1},
    {"referenceSymbol":"CERAMICS","amount":0.1},
    {"referenceSymbol":"CLAY","amount":2},
    {"referenceSymbol":"HEAT","amount":4}
]}}}"#;

fn seeded() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for recipe in read_recipes(FACTORIES.as_bytes(), RecipeKind::Factory).unwrap() {
        db::upsert_recipe(&conn, &recipe).unwrap();
    }
    conn
}

#[test]
fn imported_recipe_evaluates_without_boosts() {
    let conn = seeded();
    let recipe = db::get_recipe(&conn, "MUD_1").unwrap().unwrap();
    let prices = PriceTable::from_json_str(PRICES).unwrap();

    let e = evaluate(&recipe, &prices, &BoostState::manual(0.0, 0.0), 12.0, 100.0);

    assert_eq!(e.multipliers, Multipliers::IDENTITY);
    assert_eq!(e.per_craft.revenue, 20.0);
    assert_eq!(e.per_craft.cost, 5.0);
    assert_eq!(e.per_craft.profit, 15.0);
    assert_eq!(e.per_craft.roi, 3.0);
    assert_eq!(e.per_day.crafts_per_day, 24.0);
    assert_eq!(e.per_day.profit_per_day, 360.0);
    assert_eq!(e.start_with_input1.crafts, 2);
    assert_eq!(e.start_with_input2.crafts, 0);
    assert_eq!(e.start_with_input2.output, 0.0);
}

#[test]
fn saved_profile_drives_live_boosts() {
    let conn = seeded();
    let workshop = levels_from_json_str(
        r#"{"data":{"account":{"workshop":[{"symbol":"mud","level":10}]}}}"#,
        LevelSource::Workshop,
    )
    .unwrap();
    let mastery = levels_from_json_str(
        r#"{"data":{"account":{"proficiencies":[
            {"symbol":"mud","collectedAmount":0,"claimedLevel":1}
        ]}}}"#,
        LevelSource::Mastery,
    )
    .unwrap();

    let profile = db::upsert_profile(
        &conn,
        ProfileUpdate {
            name: "main".to_string(),
            workshop: Some(workshop),
            mastery: Some(mastery),
            workers: Some(2),
            factory_count: Some(3),
        },
    )
    .unwrap();

    let recipe = db::get_recipe(&conn, "mud_1").unwrap().unwrap();
    let mults = multipliers_for_recipe(&recipe, &profile.boost_state());
    assert_eq!(mults.duration_mult, 0.5);
    assert!((mults.input_mult - 0.98).abs() < 1e-12);

    let prices = PriceTable::from_json_str(PRICES).unwrap();
    let e = evaluate(&recipe, &prices, &profile.boost_state(), 100.0, 0.0);
    assert_eq!(e.per_day.crafts_per_day, 48.0);
    assert!((e.per_craft.cost - 4.9).abs() < 1e-9);
    // 100 / 4.9 = 20.4 -> 20 whole crafts
    assert_eq!(e.start_with_input1.crafts, 20);
}

#[test]
fn two_input_recipe_projects_both_stocks() {
    let conn = seeded();
    let recipe = db::get_recipe(&conn, "CERAMICS_1").unwrap().unwrap();
    let prices = PriceTable::from_json_str(PRICES).unwrap();

    let boost = BoostState::live(BTreeMap::new(), BTreeMap::new());
    let e = evaluate(&recipe, &prices, &boost, 35.0, 7.0);

    // 4 * 10 revenue, 10 * 0.5 + 2 * 0.25 cost
    assert_eq!(e.per_craft.revenue, 40.0);
    assert_eq!(e.per_craft.cost, 5.5);
    assert_eq!(e.per_day.crafts_per_day, 144.0);
    assert_eq!(e.start_with_input1.crafts, 3);
    assert_eq!(e.start_with_input1.required_input2, 6.0);
    assert_eq!(e.start_with_input2.crafts, 3);
    assert_eq!(e.start_with_input2.required_input1, 30.0);
    assert_eq!(e.start_with_input2.time_sec, 1800.0);

    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["per_craft"]["revenue"], 40.0);
    assert_eq!(json["recipe"]["kind"], "factory");
}
