use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::error::{ReportError, Result};

/// A user's search: free text plus a lookback window in years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    term: String,
    lookback_years: u32,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, lookback_years: i64) -> Result<Self> {
        let lookback_years = validate_years(lookback_years)?;
        Ok(Self {
            term: term.into(),
            lookback_years,
        })
    }

    /// The term exactly as typed (untrimmed).
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn lookback_years(&self) -> u32 {
        self.lookback_years
    }
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Date(NaiveDate),
    Text(String),
}

/// Statement text with its positional parameters ($1, $2, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl BuiltQuery {
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.params.iter().find_map(|p| match p {
            QueryParam::Date(d) => Some(*d),
            QueryParam::Text(_) => None,
        })
    }

    pub fn pattern(&self) -> Option<&str> {
        self.params.iter().find_map(|p| match p {
            QueryParam::Text(s) => Some(s.as_str()),
            QueryParam::Date(_) => None,
        })
    }
}

const BASE_QUERY: &str = r#"SELECT
  cab.creado::date                                            AS date,
  prod.nombre                                                 AS product_name,
  cli.nombre                                                  AS customer_name,
  det.cantidad::double precision                              AS quantity,
  det.precio_unitario_venta::double precision                 AS unit_price,
  (det.cantidad * det.precio_unitario_venta)::double precision AS line_total,
  cab.numero::text                                            AS document_number,
  alm.nombre                                                  AS warehouse_name,
  vc.enlace_pdf                                               AS invoice_link
FROM cmrlz.notas_pedido_cab cab
JOIN cmrlz.notas_pedido_det det ON det.nota_pedido_id = cab.id
JOIN extcs.productos prod       ON prod.id = det.producto_id
LEFT JOIN tcros.direcciones dir ON dir.id = cab.direccion_cliente_id
LEFT JOIN tcros.personas cli    ON cli.id = dir.persona_id
LEFT JOIN extcs.almacenes alm   ON alm.id = cab.almacen_id
LEFT JOIN cmrlz.ventas_cab vc   ON vc.id = cab.venta_id
WHERE
  cab.anulada IS FALSE
  AND cab.venta_id IS NOT NULL
  AND prod.servicio = FALSE
  AND cab.creado >= $1"#;

const TEXT_FILTER: &str =
    "\n  AND (prod.nombre ILIKE $2 OR cli.nombre ILIKE $2 OR cab.numero::text ILIKE $2)";

const ORDER_BY: &str = "\nORDER BY cab.creado DESC";

/// Days per year of lookback. Leap days are deliberately ignored.
const DAYS_PER_YEAR: u64 = 365;

fn validate_years(lookback_years: i64) -> Result<u32> {
    if lookback_years <= 0 {
        return Err(ReportError::InvalidLookback(lookback_years));
    }
    u32::try_from(lookback_years).map_err(|_| ReportError::InvalidLookback(lookback_years))
}

/// Earliest eligible order date: `today - 365 * years` days.
pub fn min_date(today: NaiveDate, lookback_years: i64) -> Result<NaiveDate> {
    let years = validate_years(lookback_years)?;
    today
        .checked_sub_days(Days::new(DAYS_PER_YEAR * u64::from(years)))
        .ok_or(ReportError::InvalidLookback(lookback_years))
}

/// Escape LIKE wildcards so the term only ever matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Build the ledger retrieval statement. Neither the term nor the date is
/// ever written into the statement text; both travel as parameters.
pub fn build(term: &str, lookback_years: i64, today: NaiveDate) -> Result<BuiltQuery> {
    let mut sql = String::from(BASE_QUERY);
    let mut params = vec![QueryParam::Date(min_date(today, lookback_years)?)];

    let trimmed = term.trim();
    if !trimmed.is_empty() {
        sql.push_str(TEXT_FILTER);
        params.push(QueryParam::Text(format!("%{}%", escape_like(trimmed))));
    }

    sql.push_str(ORDER_BY);

    debug!(
        lookback_years,
        text_filter = params.len() > 1,
        "built ledger report query"
    );

    Ok(BuiltQuery { sql, params })
}

/// Build the statement for a validated request.
pub fn build_request(request: &SearchRequest, today: NaiveDate) -> Result<BuiltQuery> {
    build(request.term(), i64::from(request.lookback_years()), today)
}
