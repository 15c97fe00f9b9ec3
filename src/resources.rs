//! Declarative resource definitions
//!
//! Each resource names its table, primary key, columns and the query-string whitelist
//! the filter and sort builders are driven by. Handlers and stores never see a column
//! name that is not listed here.

use serde_json::{Map, Value};

use crate::filter::{FilterField, FilterKind, SortDirection, SortSchema, SortSpec, ValueType};

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub value: ValueType,
    /// Accepted from PUT bodies
    pub writable: bool,
}

const fn col(name: &'static str, value: ValueType) -> Column {
    Column { name, value, writable: true }
}

const fn system(name: &'static str, value: ValueType) -> Column {
    Column { name, value, writable: false }
}

#[derive(Debug)]
pub struct Resource {
    /// Path segment and log label, e.g. `products`
    pub name: &'static str,
    /// Singular label used in client messages
    pub label: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [Column],
    /// Columns hidden from every response
    pub hidden: &'static [&'static str],
    pub unique: &'static [&'static str],
    pub filters: &'static [FilterField],
    pub sort: SortSchema,
}

impl Resource {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Keep only writable columns from a partial update body
    pub fn writable_changes(&self, body: &Map<String, Value>) -> Map<String, Value> {
        body.iter()
            .filter(|(key, _)| self.column(key).map_or(false, |c| c.writable))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Strip hidden columns before a record leaves the process
    pub fn present(&self, mut record: Map<String, Value>) -> Map<String, Value> {
        for hidden in self.hidden {
            record.remove(*hidden);
        }
        record
    }

    /// Canonical JSON per column type: decimals as strings, timestamps as RFC 3339 UTC.
    /// Both stores return rows through this so responses look the same whichever backs them.
    pub fn normalize(&self, mut record: Map<String, Value>) -> Map<String, Value> {
        for column in self.columns {
            if let Some(value) = record.get_mut(column.name) {
                if let Some(typed) = column.value.from_json(value) {
                    *value = typed.to_json();
                }
            }
        }
        record
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.label)
    }
}

const fn newest_first(column: &'static str) -> SortSpec {
    SortSpec { column, direction: SortDirection::Desc }
}

const TIMESTAMPS: [Column; 2] = [
    system("createdAt", ValueType::Timestamp),
    system("updatedAt", ValueType::Timestamp),
];

pub static PRODUCTS: Resource = Resource {
    name: "products",
    label: "Product",
    table: "products",
    primary_key: "prodId",
    columns: &[
        system("prodId", ValueType::Integer),
        col("name", ValueType::Text),
        col("desc", ValueType::Text),
        col("image", ValueType::Text),
        col("price", ValueType::Decimal),
        col("stock", ValueType::Integer),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField {
            column: "price",
            kind: FilterKind::Range { min: "minPrice", max: "maxPrice", value: ValueType::Decimal },
        },
        FilterField { column: "name", kind: FilterKind::Contains { param: "name" } },
        FilterField { column: "stock", kind: FilterKind::Positive { param: "inStock" } },
    ],
    sort: SortSchema {
        fields: &["name", "price", "stock", "createdAt"],
        default: newest_first("createdAt"),
    },
};

pub static SERVICES: Resource = Resource {
    name: "services",
    label: "Service",
    table: "services",
    primary_key: "serviceId",
    columns: &[
        system("serviceId", ValueType::Integer),
        col("name", ValueType::Text),
        col("description", ValueType::Text),
        col("price", ValueType::Decimal),
        col("duration", ValueType::Integer),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField {
            column: "price",
            kind: FilterKind::Range { min: "minPrice", max: "maxPrice", value: ValueType::Decimal },
        },
        FilterField { column: "name", kind: FilterKind::Contains { param: "name" } },
        FilterField {
            column: "duration",
            kind: FilterKind::Range { min: "minDuration", max: "maxDuration", value: ValueType::Integer },
        },
    ],
    sort: SortSchema {
        fields: &["name", "price", "duration", "createdAt"],
        default: newest_first("createdAt"),
    },
};

pub static BOOKINGS: Resource = Resource {
    name: "bookings",
    label: "Booking",
    table: "bookings",
    primary_key: "bookingId",
    columns: &[
        system("bookingId", ValueType::Integer),
        col("custId", ValueType::Integer),
        col("serviceId", ValueType::Integer),
        col("bookingDate", ValueType::Timestamp),
        col("status", ValueType::Text),
        col("notes", ValueType::Text),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField { column: "status", kind: FilterKind::Exact { param: "status", value: ValueType::Text } },
        FilterField { column: "custId", kind: FilterKind::Exact { param: "custId", value: ValueType::Integer } },
        FilterField {
            column: "serviceId",
            kind: FilterKind::Exact { param: "serviceId", value: ValueType::Integer },
        },
        FilterField {
            column: "bookingDate",
            kind: FilterKind::Range { min: "dateFrom", max: "dateTo", value: ValueType::Timestamp },
        },
    ],
    sort: SortSchema {
        fields: &["bookingDate", "status", "custId", "serviceId", "createdAt"],
        default: newest_first("bookingDate"),
    },
};

pub static PAYMENTS: Resource = Resource {
    name: "payments",
    label: "Payment",
    table: "payments",
    primary_key: "paymentId",
    columns: &[
        system("paymentId", ValueType::Integer),
        col("bookingId", ValueType::Integer),
        col("amount", ValueType::Decimal),
        col("paymentMethod", ValueType::Text),
        col("status", ValueType::Text),
        col("transactionId", ValueType::Text),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField { column: "status", kind: FilterKind::Exact { param: "status", value: ValueType::Text } },
        FilterField {
            column: "bookingId",
            kind: FilterKind::Exact { param: "bookingId", value: ValueType::Integer },
        },
        FilterField {
            column: "paymentMethod",
            kind: FilterKind::Exact { param: "paymentMethod", value: ValueType::Text },
        },
        FilterField {
            column: "amount",
            kind: FilterKind::Range { min: "minAmount", max: "maxAmount", value: ValueType::Decimal },
        },
    ],
    sort: SortSchema {
        fields: &["amount", "status", "paymentMethod", "createdAt"],
        default: newest_first("createdAt"),
    },
};

pub static REVIEWS: Resource = Resource {
    name: "reviews",
    label: "Review",
    table: "reviews",
    primary_key: "reviewId",
    columns: &[
        system("reviewId", ValueType::Integer),
        col("custId", ValueType::Integer),
        col("serviceId", ValueType::Integer),
        col("rating", ValueType::Integer),
        col("comment", ValueType::Text),
        col("reviewDate", ValueType::Timestamp),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField { column: "custId", kind: FilterKind::Exact { param: "custId", value: ValueType::Integer } },
        FilterField {
            column: "serviceId",
            kind: FilterKind::Exact { param: "serviceId", value: ValueType::Integer },
        },
        FilterField {
            column: "rating",
            kind: FilterKind::Range { min: "minRating", max: "maxRating", value: ValueType::Integer },
        },
    ],
    sort: SortSchema {
        fields: &["rating", "reviewDate", "createdAt"],
        default: newest_first("reviewDate"),
    },
};

pub static ORDERS: Resource = Resource {
    name: "orders",
    label: "Order",
    table: "orders",
    primary_key: "orderId",
    columns: &[
        system("orderId", ValueType::Integer),
        col("custId", ValueType::Integer),
        col("prodId", ValueType::Integer),
        col("quantity", ValueType::Integer),
        col("totalAmount", ValueType::Decimal),
        col("status", ValueType::Text),
        col("orderDate", ValueType::Timestamp),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &[],
    unique: &[],
    filters: &[
        FilterField { column: "status", kind: FilterKind::Exact { param: "status", value: ValueType::Text } },
        FilterField { column: "custId", kind: FilterKind::Exact { param: "custId", value: ValueType::Integer } },
        FilterField { column: "prodId", kind: FilterKind::Exact { param: "prodId", value: ValueType::Integer } },
        FilterField {
            column: "totalAmount",
            kind: FilterKind::Range { min: "minAmount", max: "maxAmount", value: ValueType::Decimal },
        },
        FilterField {
            column: "orderDate",
            kind: FilterKind::Range { min: "dateFrom", max: "dateTo", value: ValueType::Timestamp },
        },
    ],
    sort: SortSchema {
        fields: &["orderDate", "totalAmount", "status", "quantity", "custId", "prodId", "createdAt"],
        default: newest_first("orderDate"),
    },
};

/// Account tables are reached only through the auth handlers
pub static CUSTOMERS: Resource = Resource {
    name: "customers",
    label: "Customer",
    table: "customers",
    primary_key: "custId",
    columns: &[
        system("custId", ValueType::Integer),
        col("name", ValueType::Text),
        col("email", ValueType::Text),
        col("address", ValueType::Text),
        col("phone", ValueType::Text),
        system("password", ValueType::Text),
        system("role", ValueType::Text),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &["password"],
    unique: &["email"],
    filters: &[],
    sort: SortSchema { fields: &["createdAt"], default: newest_first("createdAt") },
};

pub static STAFF: Resource = Resource {
    name: "staff",
    label: "Staff",
    table: "staff",
    primary_key: "staffId",
    columns: &[
        system("staffId", ValueType::Integer),
        col("name", ValueType::Text),
        col("email", ValueType::Text),
        system("password", ValueType::Text),
        system("role", ValueType::Text),
        TIMESTAMPS[0],
        TIMESTAMPS[1],
    ],
    hidden: &["password"],
    unique: &["email"],
    filters: &[],
    sort: SortSchema { fields: &["createdAt"], default: newest_first("createdAt") },
};

pub static ALL: [&Resource; 8] = [
    &CUSTOMERS, &STAFF, &PRODUCTS, &SERVICES, &BOOKINGS, &PAYMENTS, &REVIEWS, &ORDERS,
];
