//! Scenario metrics: profitability projections over every combination of
//! ticket price, staff price and occupancy level of a budget scenario.
//!
//! Money values are rounded to cents, profit included, so
//! `profit == cents(revenue - total_costs)` for every row.

use serde::Serialize;

use crate::models::{BudgetScenario, LineItemBasis, LineItemKind, MAX_COMBINATIONS};

/// Projection for one (ticket price, staff price, occupancy) combination.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricRow {
    pub ticket_price: f64,
    pub staff_price: f64,
    pub occupancy: f64,
    pub guests: i64,
    pub staff: i64,
    pub headcount: i64,
    pub ticket_revenue: f64,
    pub staff_revenue: f64,
    pub other_income: f64,
    pub revenue: f64,
    pub fixed_costs: f64,
    pub variable_costs: f64,
    pub total_costs: f64,
    pub profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_head: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_ticket_price: Option<f64>,
}

/// All projections of a scenario plus a short summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetrics {
    pub scenario_id: String,
    pub rows: Vec<MetricRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<MetricRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst: Option<MetricRow>,
    pub profitable_count: usize,
}

/// Line item totals, split by kind and basis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    fixed_cost: f64,
    per_head_cost: f64,
    fixed_income: f64,
    per_head_income: f64,
}

impl Totals {
    fn of(scenario: &BudgetScenario) -> Self {
        scenario
            .line_items
            .iter()
            .fold(Totals::default(), |mut acc, item| {
                let slot = match (item.kind, item.basis) {
                    (LineItemKind::Cost, LineItemBasis::Fixed) => &mut acc.fixed_cost,
                    (LineItemKind::Cost, LineItemBasis::PerAttendee) => &mut acc.per_head_cost,
                    (LineItemKind::Income, LineItemBasis::Fixed) => &mut acc.fixed_income,
                    (LineItemKind::Income, LineItemBasis::PerAttendee) => {
                        &mut acc.per_head_income
                    }
                };
                *slot += item.amount;
                acc
            })
    }
}

/// Compute the full metrics table of a scenario.
///
/// Rows are ordered with ticket price as the outer loop, then staff price, then occupancy.
pub fn compute(scenario: &BudgetScenario) -> ScenarioMetrics {
    let totals = Totals::of(scenario);
    let capacity = scenario.capacity.max(0);
    let staff = scenario.staff_count.max(0);

    let combinations = scenario
        .ticket_prices
        .len()
        .saturating_mul(scenario.staff_prices.len())
        .saturating_mul(scenario.occupancy_levels.len());
    let mut rows = Vec::with_capacity(combinations.min(MAX_COMBINATIONS));

    for &ticket_price in &scenario.ticket_prices {
        for &staff_price in &scenario.staff_prices {
            for &occupancy in &scenario.occupancy_levels {
                rows.push(project(
                    ticket_price,
                    staff_price,
                    occupancy,
                    capacity,
                    staff,
                    &totals,
                ));
            }
        }
    }

    let best = rows
        .iter()
        .fold(None::<&MetricRow>, |best, row| match best {
            Some(b) if b.profit >= row.profit => Some(b),
            _ => Some(row),
        })
        .cloned();
    let worst = rows
        .iter()
        .fold(None::<&MetricRow>, |worst, row| match worst {
            Some(w) if w.profit <= row.profit => Some(w),
            _ => Some(row),
        })
        .cloned();
    let profitable_count = rows.iter().filter(|r| r.profit > 0.0).count();

    ScenarioMetrics {
        scenario_id: scenario.id.clone(),
        rows,
        best,
        worst,
        profitable_count,
    }
}

fn project(
    ticket_price: f64,
    staff_price: f64,
    occupancy: f64,
    capacity: i64,
    staff: i64,
    totals: &Totals,
) -> MetricRow {
    let guests = (capacity as f64 * occupancy.clamp(0.0, 100.0) / 100.0).round() as i64;
    let headcount = guests.saturating_add(staff);

    let ticket_revenue = cents(guests as f64 * ticket_price);
    let staff_revenue = cents(staff as f64 * staff_price);
    let other_income = cents(totals.fixed_income + totals.per_head_income * headcount as f64);
    let revenue = cents(ticket_revenue + staff_revenue + other_income);

    let fixed_costs = cents(totals.fixed_cost);
    let variable_costs = cents(totals.per_head_cost * headcount as f64);
    let total_costs = cents(fixed_costs + variable_costs);

    let profit = cents(revenue - total_costs);

    let margin = (revenue != 0.0).then(|| ratio(profit / revenue));
    let cost_per_head = (headcount > 0).then(|| cents(total_costs / headcount as f64));
    let break_even_ticket_price = (guests > 0).then(|| {
        let uncovered = total_costs - staff_revenue - other_income;
        cents((uncovered / guests as f64).max(0.0))
    });

    MetricRow {
        ticket_price,
        staff_price,
        occupancy,
        guests,
        staff,
        headcount,
        ticket_revenue,
        staff_revenue,
        other_income,
        revenue,
        fixed_costs,
        variable_costs,
        total_costs,
        profit,
        margin,
        cost_per_head,
        break_even_ticket_price,
    }
}

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn ratio(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;

    fn item(label: &str, kind: LineItemKind, basis: LineItemBasis, amount: f64) -> LineItem {
        LineItem {
            label: label.to_string(),
            category: None,
            kind,
            basis,
            amount,
        }
    }

    fn gala() -> BudgetScenario {
        BudgetScenario {
            id: "gala".into(),
            event_id: "event".into(),
            name: "Gala".into(),
            ticket_prices: vec![40.0, 55.0],
            staff_prices: vec![0.0, 15.0],
            occupancy_levels: vec![50.0, 80.0, 100.0],
            capacity: 120,
            staff_count: 10,
            line_items: vec![
                item("Venue", LineItemKind::Cost, LineItemBasis::Fixed, 1500.0),
                item("Catering", LineItemKind::Cost, LineItemBasis::PerAttendee, 22.5),
                item("Sponsor", LineItemKind::Income, LineItemBasis::Fixed, 500.0),
                item("Raffle", LineItemKind::Income, LineItemBasis::PerAttendee, 1.1),
            ],
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
            version: 1,
        }
    }

    #[test]
    fn test_row_count_and_order() {
        let metrics = compute(&gala());
        assert_eq!(metrics.rows.len(), 2 * 2 * 3);

        let first = &metrics.rows[0];
        assert_eq!(
            (first.ticket_price, first.staff_price, first.occupancy),
            (40.0, 0.0, 50.0)
        );
        let second = &metrics.rows[1];
        assert_eq!(second.occupancy, 80.0);
        let fourth = &metrics.rows[3];
        assert_eq!((fourth.staff_price, fourth.occupancy), (15.0, 50.0));
        let last = metrics.rows.last().unwrap();
        assert_eq!(
            (last.ticket_price, last.staff_price, last.occupancy),
            (55.0, 15.0, 100.0)
        );
    }

    #[test]
    fn test_profit_identity_holds_for_every_row() {
        let metrics = compute(&gala());
        for row in &metrics.rows {
            assert_eq!(row.profit, cents(row.revenue - row.total_costs));
            assert!((row.profit - (row.revenue - row.total_costs)).abs() < 0.005);
            assert_eq!(row.total_costs, cents(row.fixed_costs + row.variable_costs));
        }
    }

    #[test]
    fn test_known_row_values() {
        let metrics = compute(&gala());
        // 40.00 ticket, 15.00 staff, 80% of 120 seats
        let row = metrics
            .rows
            .iter()
            .find(|r| r.ticket_price == 40.0 && r.staff_price == 15.0 && r.occupancy == 80.0)
            .unwrap();

        assert_eq!(row.guests, 96);
        assert_eq!(row.headcount, 106);
        assert_eq!(row.ticket_revenue, 3840.0);
        assert_eq!(row.staff_revenue, 150.0);
        assert_eq!(row.other_income, 616.6);
        assert_eq!(row.revenue, 4606.6);
        assert_eq!(row.fixed_costs, 1500.0);
        assert_eq!(row.variable_costs, 2385.0);
        assert_eq!(row.total_costs, 3885.0);
        assert_eq!(row.profit, 721.6);
        assert_eq!(row.cost_per_head, Some(36.65));
        // (3885 - 150 - 616.6) / 96 = 32.483...
        assert_eq!(row.break_even_ticket_price, Some(32.48));
        assert!(row.margin.unwrap() > 0.15 && row.margin.unwrap() < 0.16);
    }

    #[test]
    fn test_best_and_worst() {
        let metrics = compute(&gala());
        let best = metrics.best.unwrap();
        let worst = metrics.worst.unwrap();
        assert_eq!((best.ticket_price, best.staff_price, best.occupancy), (55.0, 15.0, 100.0));
        assert_eq!((worst.ticket_price, worst.staff_price, worst.occupancy), (40.0, 0.0, 50.0));
        assert!(metrics
            .rows
            .iter()
            .all(|r| r.profit <= best.profit && r.profit >= worst.profit));
    }

    #[test]
    fn test_empty_house_has_no_ratios() {
        let mut scenario = gala();
        scenario.staff_count = 0;
        scenario.occupancy_levels = vec![0.0];
        scenario.line_items = vec![item("Venue", LineItemKind::Cost, LineItemBasis::Fixed, 300.0)];

        let metrics = compute(&scenario);
        for row in &metrics.rows {
            assert_eq!(row.guests, 0);
            assert_eq!(row.revenue, 0.0);
            assert_eq!(row.profit, -300.0);
            assert_eq!(row.margin, None);
            assert_eq!(row.cost_per_head, None);
            assert_eq!(row.break_even_ticket_price, None);
        }
        assert_eq!(metrics.profitable_count, 0);
    }

    #[test]
    fn test_break_even_never_negative() {
        let mut scenario = gala();
        scenario.line_items = vec![item(
            "Grant",
            LineItemKind::Income,
            LineItemBasis::Fixed,
            10_000.0,
        )];
        let metrics = compute(&scenario);
        assert!(metrics
            .rows
            .iter()
            .all(|r| r.break_even_ticket_price == Some(0.0)));
    }

    #[test]
    fn test_oversized_inputs_do_not_overflow() {
        let mut scenario = gala();
        scenario.capacity = i64::MAX;
        scenario.staff_count = i64::MAX;
        scenario.occupancy_levels = vec![100.0];

        let metrics = compute(&scenario);
        assert!(metrics.rows.iter().all(|r| r.headcount == i64::MAX));
    }
}
