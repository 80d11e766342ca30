//! The fixed analytical schema every plan is validated against.

use serde::{Deserialize, Serialize};

/// Whitelisted source, field and function names.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub source: &'static str,
    pub temporal: &'static [&'static str],
    pub categorical: &'static [&'static str],
    pub metrics: &'static [&'static str],
    pub functions: &'static [&'static str],
}

/// The retail `orders` table the reference executor serves.
pub const ORDERS: Schema = Schema {
    source: "orders",
    temporal: &["order_date", "ship_date"],
    categorical: &[
        "customer_name",
        "segment",
        "country",
        "city",
        "state",
        "postal_code",
        "region",
        "product_name",
        "category",
        "sub_category",
        "ship_mode",
    ],
    metrics: &["sales", "quantity", "discount", "profit"],
    functions: &["SUM", "DATE_TRUNC"],
};

/// Column used for every time bucket and year filter.
pub const DATE_FIELD: &str = "order_date";

impl Schema {
    /// Whether `field` is a temporal, categorical or metric column.
    pub fn is_field(&self, field: &str) -> bool {
        let field = field.to_ascii_lowercase();
        self.temporal
            .iter()
            .chain(self.categorical)
            .chain(self.metrics)
            .any(|f| *f == field)
    }

    /// Whether `name` is one of the permitted function names.
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Field whitelist check that also admits the function names.
    pub fn allows(&self, name: &str) -> bool {
        self.is_field(name) || self.is_function(name)
    }
}

impl Default for Schema {
    fn default() -> Self {
        ORDERS
    }
}

/// Measures a question can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Sales,
    Profit,
    Quantity,
    Discount,
}

impl MetricField {
    pub const ALL: [MetricField; 4] = [Self::Sales, Self::Profit, Self::Quantity, Self::Discount];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Profit => "profit",
            Self::Quantity => "quantity",
            Self::Discount => "discount",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Sales",
            Self::Profit => "Profit",
            Self::Quantity => "Quantity",
            Self::Discount => "Discount",
        }
    }

    /// Parse a column name or a common synonym ("revenue" is sales).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" | "revenue" => Some(Self::Sales),
            "profit" | "profits" => Some(Self::Profit),
            "quantity" | "units" => Some(Self::Quantity),
            "discount" | "discounts" => Some(Self::Discount),
            _ => None,
        }
    }

    /// Whether values of this metric are money.
    pub fn is_currency(&self) -> bool {
        matches!(self, Self::Sales | Self::Profit)
    }
}

/// Dimensions a question can group or filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    CustomerName,
    Segment,
    Country,
    City,
    State,
    Region,
    ProductName,
    Category,
    SubCategory,
    ShipMode,
}

impl CategoricalField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CustomerName => "customer_name",
            Self::Segment => "segment",
            Self::Country => "country",
            Self::City => "city",
            Self::State => "state",
            Self::Region => "region",
            Self::ProductName => "product_name",
            Self::Category => "category",
            Self::SubCategory => "sub_category",
            Self::ShipMode => "ship_mode",
        }
    }

    /// Plural display label, used in chart titles ("Top 5 Customers").
    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomerName => "Customers",
            Self::Segment => "Segments",
            Self::Country => "Countries",
            Self::City => "Cities",
            Self::State => "States",
            Self::Region => "Regions",
            Self::ProductName => "Products",
            Self::Category => "Categories",
            Self::SubCategory => "Sub-Categories",
            Self::ShipMode => "Ship Modes",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        match column {
            "customer_name" => Some(Self::CustomerName),
            "segment" => Some(Self::Segment),
            "country" => Some(Self::Country),
            "city" => Some(Self::City),
            "state" => Some(Self::State),
            "region" => Some(Self::Region),
            "product_name" => Some(Self::ProductName),
            "category" => Some(Self::Category),
            "sub_category" => Some(Self::SubCategory),
            "ship_mode" => Some(Self::ShipMode),
            _ => None,
        }
    }
}
