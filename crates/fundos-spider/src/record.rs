use serde::Serialize;

/// Status Invest renders an unavailable value as a dash.
pub const DISPLAY_PLACEHOLDER: &str = "-";

/// True when a scraped field holds no usable value (never set, or the site's placeholder).
pub fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == DISPLAY_PLACEHOLDER
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("empty ticker")]
    Empty,

    #[error("ticker {0:?} is not alphanumeric")]
    Malformed(String),
}

/// The latest dividend disclosure of one fund, as scraped during a single run.
///
/// Identity (`ticker`, `source_url`) is fixed at construction; the four payment fields start
/// empty and are filled by an [`Extractor`](crate::scrape::Extractor) through [`apply`].
///
/// [`apply`]: FundRecord::apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundRecord {
    ticker: String,
    source_url: String,
    base_date: String,
    payment_date: String,
    payment_amount: String,
    unit_price: String,
}

impl FundRecord {
    pub fn new(ticker: &str, base_url: &str) -> Result<Self, RecordError> {
        let ticker = ticker.trim().to_lowercase();
        if ticker.is_empty() {
            return Err(RecordError::Empty);
        }
        if !ticker.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RecordError::Malformed(ticker));
        }

        Ok(Self {
            source_url: format!("{base_url}{ticker}"),
            ticker,
            base_date: String::new(),
            payment_date: String::new(),
            payment_amount: String::new(),
            unit_price: String::new(),
        })
    }

    /// Lowercase ticker; the lookup and document key.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Uppercase ticker, as stored in the document body.
    pub fn display_ticker(&self) -> String {
        self.ticker.to_uppercase()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn base_date(&self) -> &str {
        &self.base_date
    }

    pub fn payment_date(&self) -> &str {
        &self.payment_date
    }

    pub fn payment_amount(&self) -> &str {
        &self.payment_amount
    }

    pub fn unit_price(&self) -> &str {
        &self.unit_price
    }

    /// Copy every extracted field into the record; fields the extractor could not find keep
    /// their current value.
    pub fn apply(&mut self, fields: PaymentFields) {
        let PaymentFields {
            base_date,
            payment_date,
            payment_amount,
            unit_price,
        } = fields;

        if let Some(val) = base_date {
            self.base_date = val;
        }
        if let Some(val) = payment_date {
            self.payment_date = val;
        }
        if let Some(val) = payment_amount {
            self.payment_amount = val;
        }
        if let Some(val) = unit_price {
            self.unit_price = val;
        }
    }

    /// A meaningful update carries both dates and the payment amount. The unit price alone
    /// does not count.
    pub fn is_meaningful(&self) -> bool {
        !is_unset(&self.payment_amount) && !is_unset(&self.base_date) && !is_unset(&self.payment_date)
    }
}

/// The fields one page yielded; `None` where the markup group was missing or too short.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFields {
    pub base_date: Option<String>,
    pub payment_date: Option<String>,
    pub payment_amount: Option<String>,
    pub unit_price: Option<String>,
}

/// Replace the decimal comma used by the source (`"1,05"`) with a period.
pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
