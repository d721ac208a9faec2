//! Column descriptors.
//!
//! A [`ColumnDefinition`] is a column name, a [`ColumnType`] and a set of
//! optional modifier attributes. An attribute is "present" when it is
//! `Some`; grammars only run a modifier for attributes that are present.

use serde::{Deserialize, Deserializer};

use crate::expression::Expression;

// =============================================================================
// Column Types
// =============================================================================

/// The dialect-neutral type of a column.
///
/// In declarative change-sets the type is the `type` key of the column
/// object, with any parameters as sibling keys:
///
/// ```json
/// { "name": "title", "type": "string", "length": 100 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ColumnType {
    /// Fixed-length character string.
    Char {
        /// Number of characters.
        length: Option<u32>,
    },
    /// Variable-length character string.
    String {
        /// Maximum length; the grammar default applies when absent.
        length: Option<u32>,
    },
    Text,
    MediumText,
    LongText,
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,
    /// Floating point number.
    Float {
        total: Option<u32>,
        places: Option<u32>,
    },
    /// Double precision number.
    Double {
        total: Option<u32>,
        places: Option<u32>,
    },
    /// Fixed precision number.
    Decimal {
        total: Option<u32>,
        places: Option<u32>,
    },
    Boolean,
    /// One of a fixed set of string values.
    Enum {
        /// The allowed values, in declaration order.
        allowed: Vec<String>,
    },
    Json,
    Jsonb,
    Date,
    DateTime {
        #[serde(default)]
        precision: u8,
    },
    DateTimeTz {
        #[serde(default)]
        precision: u8,
    },
    Time,
    TimeTz,
    Timestamp {
        #[serde(default)]
        precision: u8,
        /// Default the column to the current time.
        #[serde(default)]
        use_current: bool,
    },
    TimestampTz {
        #[serde(default)]
        precision: u8,
        #[serde(default)]
        use_current: bool,
    },
    Binary,
    Uuid,
    IpAddress,
    MacAddress,
}

/// Fieldless discriminant of [`ColumnType`], used as a dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Char,
    String,
    Text,
    MediumText,
    LongText,
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,
    Float,
    Double,
    Decimal,
    Boolean,
    Enum,
    Json,
    Jsonb,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Binary,
    Uuid,
    IpAddress,
    MacAddress,
}

impl TypeKind {
    /// Returns the type name as written in change-set files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::String => "string",
            Self::Text => "text",
            Self::MediumText => "mediumText",
            Self::LongText => "longText",
            Self::TinyInteger => "tinyInteger",
            Self::SmallInteger => "smallInteger",
            Self::MediumInteger => "mediumInteger",
            Self::Integer => "integer",
            Self::BigInteger => "bigInteger",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::DateTimeTz => "dateTimeTz",
            Self::Time => "time",
            Self::TimeTz => "timeTz",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestampTz",
            Self::Binary => "binary",
            Self::Uuid => "uuid",
            Self::IpAddress => "ipAddress",
            Self::MacAddress => "macAddress",
        }
    }
}

impl ColumnType {
    /// Returns the fieldless kind of this type.
    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        match self {
            Self::Char { .. } => TypeKind::Char,
            Self::String { .. } => TypeKind::String,
            Self::Text => TypeKind::Text,
            Self::MediumText => TypeKind::MediumText,
            Self::LongText => TypeKind::LongText,
            Self::TinyInteger => TypeKind::TinyInteger,
            Self::SmallInteger => TypeKind::SmallInteger,
            Self::MediumInteger => TypeKind::MediumInteger,
            Self::Integer => TypeKind::Integer,
            Self::BigInteger => TypeKind::BigInteger,
            Self::Float { .. } => TypeKind::Float,
            Self::Double { .. } => TypeKind::Double,
            Self::Decimal { .. } => TypeKind::Decimal,
            Self::Boolean => TypeKind::Boolean,
            Self::Enum { .. } => TypeKind::Enum,
            Self::Json => TypeKind::Json,
            Self::Jsonb => TypeKind::Jsonb,
            Self::Date => TypeKind::Date,
            Self::DateTime { .. } => TypeKind::DateTime,
            Self::DateTimeTz { .. } => TypeKind::DateTimeTz,
            Self::Time => TypeKind::Time,
            Self::TimeTz => TypeKind::TimeTz,
            Self::Timestamp { .. } => TypeKind::Timestamp,
            Self::TimestampTz { .. } => TypeKind::TimestampTz,
            Self::Binary => TypeKind::Binary,
            Self::Uuid => TypeKind::Uuid,
            Self::IpAddress => TypeKind::IpAddress,
            Self::MacAddress => TypeKind::MacAddress,
        }
    }

    /// Returns the type name as written in change-set files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Integer family: the types that can auto-increment.
    #[must_use]
    pub const fn is_serial(&self) -> bool {
        matches!(
            self,
            Self::TinyInteger
                | Self::SmallInteger
                | Self::MediumInteger
                | Self::Integer
                | Self::BigInteger
        )
    }

    /// Types that accept the `UNSIGNED` modifier.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_serial()
            || matches!(
                self,
                Self::Float { .. } | Self::Double { .. } | Self::Decimal { .. }
            )
    }

    /// Types that accept character set and collation modifiers.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(
            self,
            Self::Char { .. }
                | Self::String { .. }
                | Self::Text
                | Self::MediumText
                | Self::LongText
                | Self::Enum { .. }
                | Self::Uuid
                | Self::IpAddress
                | Self::MacAddress
        )
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// Raw SQL expression, emitted verbatim (e.g. `CURRENT_TIMESTAMP`).
    Expression(Expression),
    /// NULL default.
    Null,
    /// Boolean default, rendered as `1` or `0`.
    Bool(bool),
    /// Integer default.
    Int(i64),
    /// Float default.
    Float(f64),
    /// String default.
    Text(String),
}

impl From<Expression> for DefaultValue {
    fn from(value: Expression) -> Self {
        Self::Expression(value)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A fluent index request on a column: on/off, or on with an explicit name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IndexFlag {
    Enabled(bool),
    Named(String),
}

impl IndexFlag {
    /// Whether the flag requests an index.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,
            Self::Named(name) => !name.is_empty(),
        }
    }

    /// The explicit index name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Enabled(_) => None,
            Self::Named(name) => Some(name),
        }
    }
}

// `Option<DefaultValue>` would read JSON `null` as "absent"; a present
// `null` key means a NULL default.
fn present_default<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

// =============================================================================
// Column Definition
// =============================================================================

/// A column added to, or changed on, a table.
///
/// Setters take `&mut self` so they can be chained on the reference a
/// [`Blueprint`](crate::Blueprint) hands back:
///
/// ```rust
/// use tramp_schema::Blueprint;
///
/// let mut table = Blueprint::new("users");
/// table.string("email", None).unique().comment("login");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(flatten)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub unsigned: Option<bool>,
    #[serde(default)]
    pub auto_increment: Option<bool>,
    /// Absent means NOT NULL when the modifier is rendered directly.
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default, deserialize_with = "present_default")]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    /// Place the column after this one.
    #[serde(default)]
    pub after: Option<String>,
    /// Place the column first.
    #[serde(default)]
    pub first: Option<bool>,
    /// Generated virtual column expression.
    #[serde(default)]
    pub virtual_as: Option<String>,
    /// Generated stored column expression.
    #[serde(default)]
    pub stored_as: Option<String>,
    #[serde(default)]
    pub primary: Option<IndexFlag>,
    #[serde(default)]
    pub unique: Option<IndexFlag>,
    #[serde(default)]
    pub index: Option<IndexFlag>,
    /// The column already exists and is being altered.
    #[serde(default)]
    pub change: Option<bool>,
    /// New name for a changed column.
    #[serde(default, alias = "newName")]
    pub rename_to: Option<String>,
}

impl ColumnDefinition {
    /// Creates a column with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            unsigned: None,
            auto_increment: None,
            nullable: None,
            default: None,
            comment: None,
            charset: None,
            collation: None,
            after: None,
            first: None,
            virtual_as: None,
            stored_as: None,
            primary: None,
            unique: None,
            index: None,
            change: None,
            rename_to: None,
        }
    }

    /// Whether this column alters an existing one.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.change.unwrap_or(false)
    }

    /// Whether this column is a generated (virtual or stored) column.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.virtual_as.as_deref().is_some_and(|expr| !expr.is_empty())
            || self.stored_as.as_deref().is_some_and(|expr| !expr.is_empty())
    }

    /// Marks the column as an alteration of an existing column.
    pub fn change(&mut self) -> &mut Self {
        self.change = Some(true);
        self
    }

    /// Renames the column; only meaningful together with [`Self::change`].
    pub fn rename_to(&mut self, name: impl Into<String>) -> &mut Self {
        self.rename_to = Some(name.into());
        self
    }

    /// Allows NULL values.
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = Some(true);
        self
    }

    /// Explicitly forbids NULL values.
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = Some(false);
        self
    }

    /// Sets the default value.
    pub fn default(&mut self, value: impl Into<DefaultValue>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Marks a numeric column as unsigned.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = Some(true);
        self
    }

    /// Marks an integer column as auto-incrementing.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = Some(true);
        self
    }

    /// Defaults a timestamp column to the current time. No effect on other
    /// types.
    pub fn use_current(&mut self) -> &mut Self {
        if let ColumnType::Timestamp { use_current, .. }
        | ColumnType::TimestampTz { use_current, .. } = &mut self.column_type
        {
            *use_current = true;
        }
        self
    }

    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    pub fn first(&mut self) -> &mut Self {
        self.first = Some(true);
        self
    }

    /// Makes this a virtual generated column.
    pub fn virtual_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.virtual_as = Some(expression.into());
        self
    }

    /// Makes this a stored generated column.
    pub fn stored_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.stored_as = Some(expression.into());
        self
    }

    /// Requests a primary key on this column with a derived name.
    pub fn primary(&mut self) -> &mut Self {
        self.primary = Some(IndexFlag::Enabled(true));
        self
    }

    /// Requests a primary key on this column with an explicit name.
    pub fn primary_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.primary = Some(IndexFlag::Named(name.into()));
        self
    }

    /// Requests a unique index on this column with a derived name.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = Some(IndexFlag::Enabled(true));
        self
    }

    pub fn unique_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.unique = Some(IndexFlag::Named(name.into()));
        self
    }

    /// Requests a plain index on this column with a derived name.
    pub fn index(&mut self) -> &mut Self {
        self.index = Some(IndexFlag::Enabled(true));
        self
    }

    pub fn index_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.index = Some(IndexFlag::Named(name.into()));
        self
    }
}
