use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::report::ReportTable;

/// Label used when an order has no linked customer.
pub const NO_CUSTOMER: &str = "(sin cliente)";

/// Summary tiles shown above the results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportMetrics {
    pub total_revenue: f64,
    pub total_quantity: f64,
    pub order_count: usize,
    pub average_unit_price: f64,
}

/// Single pass over the table. Ledger values are trusted, so negative
/// quantities or prices are summed as they come.
pub fn aggregate(table: &ReportTable) -> ReportMetrics {
    let mut total_revenue = 0.0;
    let mut total_quantity = 0.0;
    let mut documents: HashSet<&str> = HashSet::new();

    for row in table {
        total_revenue += row.line_total;
        total_quantity += row.quantity;
        documents.insert(row.document_number.as_str());
    }

    let average_unit_price = if total_quantity == 0.0 {
        0.0
    } else {
        total_revenue / total_quantity
    };

    ReportMetrics {
        total_revenue,
        total_quantity,
        order_count: documents.len(),
        average_unit_price,
    }
}

/// Revenue attributed to one product or customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueShare {
    pub name: String,
    pub revenue: f64,
}

/// Revenue for one calendar month, keyed by the month's last day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month_end: NaiveDate,
    pub revenue: f64,
}

fn rank(totals: HashMap<&str, f64>, limit: usize) -> Vec<RevenueShare> {
    let mut shares: Vec<RevenueShare> = totals
        .into_iter()
        .map(|(name, revenue)| RevenueShare {
            name: name.to_string(),
            revenue,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    shares.truncate(limit);
    shares
}

/// Products by revenue, highest first.
pub fn top_products(table: &ReportTable, limit: usize) -> Vec<RevenueShare> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in table {
        *totals.entry(row.product_name.as_str()).or_default() += row.line_total;
    }
    rank(totals, limit)
}

/// Customers by revenue, highest first.
pub fn top_customers(table: &ReportTable, limit: usize) -> Vec<RevenueShare> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in table {
        let name = row.customer_name.as_deref().unwrap_or(NO_CUSTOMER);
        *totals.entry(name).or_default() += row.line_total;
    }
    rank(totals, limit)
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.pred_opt())
}

/// Revenue per calendar month, oldest month first. Months with no sales
/// between the first and last month are reported as zero.
pub fn monthly_revenue(table: &ReportTable) -> Vec<MonthlyRevenue> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in table {
        if let Some(end) = month_end(row.date) {
            *totals.entry(end).or_default() += row.line_total;
        }
    }

    let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut cursor = Some(first);
    while let Some(end) = cursor.filter(|d| *d <= last) {
        out.push(MonthlyRevenue {
            month_end: end,
            revenue: totals.get(&end).copied().unwrap_or(0.0),
        });
        cursor = end.succ_opt().and_then(month_end);
    }
    out
}
