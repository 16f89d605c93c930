use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;

use crate::error::ReportError;

/// One sold line item.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub product_name: String,
    pub customer_name: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
    pub document_number: String,
    pub warehouse_name: Option<String>,
    pub invoice_link: Option<String>,
}

/// Rows in display order, most recent first as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTable {
    rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportRow> {
        self.rows.iter()
    }
}

impl From<Vec<ReportRow>> for ReportTable {
    fn from(rows: Vec<ReportRow>) -> Self {
        Self::new(rows)
    }
}

impl<'a> IntoIterator for &'a ReportTable {
    type Item = &'a ReportRow;
    type IntoIter = std::slice::Iter<'a, ReportRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// How a column's cells are typed and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Text,
    Quantity,
    Currency,
    Link,
}

/// A cell value pulled out of a row for a given column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Date(NaiveDate),
    Text(&'a str),
    Number(f64),
    Empty,
}

impl CellValue<'_> {
    /// Plain textual form, used for column sizing.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Text(s) => s.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

/// Ledger report columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportColumn {
    Date,
    Product,
    Customer,
    Quantity,
    UnitPrice,
    LineTotal,
    DocumentNumber,
    Warehouse,
    InvoiceLink,
}

impl ReportColumn {
    pub const ALL: [ReportColumn; 9] = [
        ReportColumn::Date,
        ReportColumn::Product,
        ReportColumn::Customer,
        ReportColumn::Quantity,
        ReportColumn::UnitPrice,
        ReportColumn::LineTotal,
        ReportColumn::DocumentNumber,
        ReportColumn::Warehouse,
        ReportColumn::InvoiceLink,
    ];

    pub fn header(self) -> &'static str {
        match self {
            ReportColumn::Date => "Fecha",
            ReportColumn::Product => "Producto",
            ReportColumn::Customer => "Cliente",
            ReportColumn::Quantity => "Cant.",
            ReportColumn::UnitPrice => "Precio Unit.",
            ReportColumn::LineTotal => "Importe Total",
            ReportColumn::DocumentNumber => "Nº Documento",
            ReportColumn::Warehouse => "Almacén",
            ReportColumn::InvoiceLink => "Enlace PDF",
        }
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            ReportColumn::Date => ColumnKind::Date,
            ReportColumn::Quantity => ColumnKind::Quantity,
            ReportColumn::UnitPrice | ReportColumn::LineTotal => ColumnKind::Currency,
            ReportColumn::InvoiceLink => ColumnKind::Link,
            ReportColumn::Product
            | ReportColumn::Customer
            | ReportColumn::DocumentNumber
            | ReportColumn::Warehouse => ColumnKind::Text,
        }
    }

    /// Short identifier accepted on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ReportColumn::Date => "date",
            ReportColumn::Product => "product",
            ReportColumn::Customer => "customer",
            ReportColumn::Quantity => "quantity",
            ReportColumn::UnitPrice => "unit-price",
            ReportColumn::LineTotal => "total",
            ReportColumn::DocumentNumber => "document",
            ReportColumn::Warehouse => "warehouse",
            ReportColumn::InvoiceLink => "invoice-link",
        }
    }

    pub fn value(self, row: &ReportRow) -> CellValue<'_> {
        fn text(value: &Option<String>) -> CellValue<'_> {
            value
                .as_deref()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty)
        }

        match self {
            ReportColumn::Date => CellValue::Date(row.date),
            ReportColumn::Product => CellValue::Text(&row.product_name),
            ReportColumn::Customer => text(&row.customer_name),
            ReportColumn::Quantity => CellValue::Number(row.quantity),
            ReportColumn::UnitPrice => CellValue::Number(row.unit_price),
            ReportColumn::LineTotal => CellValue::Number(row.line_total),
            ReportColumn::DocumentNumber => CellValue::Text(&row.document_number),
            ReportColumn::Warehouse => text(&row.warehouse_name),
            ReportColumn::InvoiceLink => text(&row.invoice_link),
        }
    }
}

impl FromStr for ReportColumn {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ReportColumn::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let keys: Vec<&str> = ReportColumn::ALL.iter().map(|c| c.key()).collect();
                ReportError::UnknownColumn(wanted.to_string(), keys.join(", "))
            })
    }
}
