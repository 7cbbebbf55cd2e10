use crate::{
    core::value::Value,
    pagination::error::InvalidOrderError,
    records::row::RowData,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Where NULLs land in the output order of a column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsPosition {
    First,
    Last,
}

/// One column of an ordering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    pub name: String,
    pub direction: SortDirection,
    /// The column may hold NULL.
    pub nullable: bool,
    /// The column is unique (e.g. a primary key); nothing after it affects the order.
    pub distinct: bool,
    /// Overrides the default NULL placement.
    pub nulls: Option<NullsPosition>,
}

impl ColumnOrder {
    pub fn new(name: &str, direction: SortDirection) -> Self {
        ColumnOrder {
            name: name.trim().to_string(),
            direction,
            nullable: false,
            distinct: false,
            nulls: None,
        }
    }

    pub fn asc(name: &str) -> Self {
        Self::new(name, SortDirection::Asc)
    }

    pub fn desc(name: &str) -> Self {
        Self::new(name, SortDirection::Desc)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsPosition::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsPosition::Last);
        self
    }

    /// NULL placement in output order.
    ///
    /// Defaults to NULLs sorting above every value: last for ASC, first for DESC.
    pub fn nulls_position(&self) -> NullsPosition {
        self.nulls.unwrap_or(match self.direction {
            SortDirection::Asc => NullsPosition::Last,
            SortDirection::Desc => NullsPosition::First,
        })
    }

    /// Orders two values of this column as they appear in the output.
    pub fn compare_values(&self, a: &Value, b: &Value) -> Ordering {
        let nulls = self.nulls_position();
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match nulls {
                NullsPosition::First => Ordering::Less,
                NullsPosition::Last => Ordering::Greater,
            },
            (false, true) => match nulls {
                NullsPosition::First => Ordering::Greater,
                NullsPosition::Last => Ordering::Less,
            },
            (false, false) => {
                let ord = a.total_cmp(b);
                match self.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{dir}", self.name)?;
        if self.nullable {
            write!(f, ":nullable")?;
        }
        if self.distinct {
            write!(f, ":distinct")?;
        }
        match self.nulls {
            Some(NullsPosition::First) => write!(f, ":nulls-first"),
            Some(NullsPosition::Last) => write!(f, ":nulls-last"),
            None => Ok(()),
        }
    }
}

impl FromStr for ColumnOrder {
    type Err = InvalidOrderError;

    /// Parses `name[:flag]*`, e.g. `created_at:desc` or `id:asc:distinct`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(InvalidOrderError::Syntax(format!(
                "missing column name in '{s}'"
            )));
        }

        let mut column = ColumnOrder::asc(name);
        for flag in parts {
            match flag.to_ascii_lowercase().as_str() {
                "asc" => column.direction = SortDirection::Asc,
                "desc" => column.direction = SortDirection::Desc,
                "nullable" => column.nullable = true,
                "distinct" => column.distinct = true,
                "nulls-first" => column.nulls = Some(NullsPosition::First),
                "nulls-last" => column.nulls = Some(NullsPosition::Last),
                other => {
                    return Err(InvalidOrderError::Syntax(format!(
                        "unknown flag '{other}' for column '{name}'"
                    )));
                }
            }
        }
        Ok(column)
    }
}

/// A validated, total ordering over rows.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    columns: Vec<ColumnOrder>,
}

impl OrderSpec {
    pub fn new(columns: Vec<ColumnOrder>) -> Result<Self, InvalidOrderError> {
        if columns.is_empty() {
            return Err(InvalidOrderError::Empty);
        }

        for (i, column) in columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(InvalidOrderError::Syntax("empty column name".into()));
            }
            if columns[..i].iter().any(|c| c.matches_name(&column.name)) {
                return Err(InvalidOrderError::DuplicateColumn(column.name.clone()));
            }
        }

        if !columns.iter().any(|c| c.distinct) {
            return Err(InvalidOrderError::MissingDistinct);
        }

        Ok(OrderSpec { columns })
    }

    pub fn columns(&self) -> &[ColumnOrder] {
        &self.columns
    }

    /// The columns that define the order: everything up to and including the
    /// first distinct column.
    pub fn key_columns(&self) -> &[ColumnOrder] {
        let end = self
            .columns
            .iter()
            .position(|c| c.distinct)
            .map_or(self.columns.len(), |i| i + 1);
        &self.columns[..end]
    }

    pub fn column(&self, name: &str) -> Option<&ColumnOrder> {
        self.columns.iter().find(|c| c.matches_name(name))
    }

    /// Position of `name` among the key columns.
    pub fn key_position(&self, name: &str) -> Option<usize> {
        self.key_columns().iter().position(|c| c.matches_name(name))
    }

    /// Orders two rows by the key columns.
    pub fn compare_rows(&self, a: &RowData, b: &RowData) -> Ordering {
        for column in self.key_columns() {
            let ord = column.compare_values(&a.get_value(&column.name), &b.get_value(&column.name));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable hash of the key columns, used to bind cursor tokens to an ordering.
    pub fn fingerprint(&self) -> u64 {
        let canonical = self
            .key_columns()
            .iter()
            .map(|c| {
                let dir = match c.direction {
                    SortDirection::Asc => 'a',
                    SortDirection::Desc => 'd',
                };
                let nulls = match c.nulls_position() {
                    NullsPosition::First => 'f',
                    NullsPosition::Last => 'l',
                };
                format!("{}:{dir}:{nulls}", c.name.to_ascii_lowercase())
            })
            .collect::<Vec<_>>()
            .join(",");
        xxh3_64(canonical.as_bytes())
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for OrderSpec {
    type Err = InvalidOrderError;

    /// Parses a comma-separated list of columns, e.g.
    /// `created_at:desc,id:desc:distinct`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let columns = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(ColumnOrder::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        OrderSpec::new(columns)
    }
}

impl<'de> Deserialize<'de> for OrderSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let columns = Vec::<ColumnOrder>::deserialize(deserializer)?;
        OrderSpec::new(columns).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnOrder, NullsPosition, OrderSpec, SortDirection};
    use crate::{
        core::value::Value, pagination::error::InvalidOrderError, records::row::RowData,
    };
    use std::cmp::Ordering;

    #[test]
    fn test_rejects_empty() {
        assert_eq!(OrderSpec::new(vec![]), Err(InvalidOrderError::Empty));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = OrderSpec::new(vec![ColumnOrder::asc("id"), ColumnOrder::desc("ID").distinct()])
            .unwrap_err();
        assert_eq!(err, InvalidOrderError::DuplicateColumn("ID".into()));
    }

    #[test]
    fn test_rejects_missing_distinct() {
        let err = OrderSpec::new(vec![ColumnOrder::desc("created_at")]).unwrap_err();
        assert_eq!(err, InvalidOrderError::MissingDistinct);
    }

    #[test]
    fn test_key_columns_stop_at_first_distinct() {
        let order = OrderSpec::new(vec![
            ColumnOrder::desc("created_at"),
            ColumnOrder::desc("id").distinct(),
            ColumnOrder::asc("name"),
        ])
        .unwrap();

        let names: Vec<_> = order.key_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["created_at", "id"]);
        assert_eq!(order.key_position("name"), None);
        assert!(order.column("name").is_some());
    }

    #[test]
    fn test_default_nulls_position() {
        assert_eq!(ColumnOrder::asc("a").nulls_position(), NullsPosition::Last);
        assert_eq!(ColumnOrder::desc("a").nulls_position(), NullsPosition::First);
        assert_eq!(
            ColumnOrder::asc("a").nulls_first().nulls_position(),
            NullsPosition::First
        );
    }

    #[test]
    fn test_compare_values_with_nulls() {
        let asc = ColumnOrder::asc("a").nullable();
        assert_eq!(asc.compare_values(&Value::Null, &Value::Int(1)), Ordering::Greater);
        assert_eq!(asc.compare_values(&Value::Int(1), &Value::Int(2)), Ordering::Less);

        let desc = ColumnOrder::desc("a").nullable();
        assert_eq!(desc.compare_values(&Value::Null, &Value::Int(1)), Ordering::Less);
        assert_eq!(desc.compare_values(&Value::Int(1), &Value::Int(2)), Ordering::Greater);
        assert_eq!(desc.compare_values(&Value::Null, &Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_compare_rows_uses_tie_breaker() {
        let order: OrderSpec = "created_at:desc,id:desc:distinct".parse().unwrap();
        let a = RowData::from_pairs("t", [("created_at", Value::Int(5)), ("id", Value::Int(2))]);
        let b = RowData::from_pairs("t", [("created_at", Value::Int(5)), ("id", Value::Int(1))]);
        assert_eq!(order.compare_rows(&a, &b), Ordering::Less);
        assert_eq!(order.compare_rows(&b, &a), Ordering::Greater);
        assert_eq!(order.compare_rows(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_parse_order() {
        let order: OrderSpec = "deleted_at:asc:nullable:nulls-first, id:desc:distinct"
            .parse()
            .unwrap();
        let first = &order.columns()[0];
        assert_eq!(first.name, "deleted_at");
        assert_eq!(first.direction, SortDirection::Asc);
        assert!(first.nullable);
        assert_eq!(first.nulls, Some(NullsPosition::First));
        assert!(order.columns()[1].distinct);
        assert_eq!(
            order.to_string(),
            "deleted_at:asc:nullable:nulls-first,id:desc:distinct"
        );
    }

    #[test]
    fn test_parse_order_rejects_unknown_flag() {
        let err = "id:sideways:distinct".parse::<OrderSpec>().unwrap_err();
        assert!(matches!(err, InvalidOrderError::Syntax(_)));
    }

    #[test]
    fn test_fingerprint_tracks_direction() {
        let a: OrderSpec = "created_at:desc,id:desc:distinct".parse().unwrap();
        let b: OrderSpec = "created_at:asc,id:desc:distinct".parse().unwrap();
        let c: OrderSpec = "CREATED_AT:desc,id:desc:distinct,extra".parse().unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_deserialize_validates() {
        let err = serde_json::from_str::<OrderSpec>(
            r#"[{"name":"a","direction":"Asc","nullable":false,"distinct":false,"nulls":null}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }
}
