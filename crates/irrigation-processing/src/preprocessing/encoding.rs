//! One-hot encoding of categorical columns.

use polars::prelude::*;

use crate::error::Result;

/// Sorted distinct non-null values of a column, rendered as text.
pub fn categories(series: &Series) -> Result<Vec<String>> {
    let as_text = series.cast(&DataType::String)?;
    let mut values: Vec<String> = as_text
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    Ok(values)
}

/// Replace `column` with one `Float64` indicator per observed category.
///
/// Indicators are named `{prefix}_{category}` and appended after the
/// remaining columns, in sorted category order. A null cell sets every
/// indicator of its row to 0. If `column` is absent the frame is returned
/// unchanged and no indicator is created.
pub fn one_hot(df: &DataFrame, column: &str, prefix: &str) -> Result<(DataFrame, Vec<String>)> {
    let Ok(source) = df.column(column) else {
        return Ok((df.clone(), Vec::new()));
    };

    let as_text = source.as_materialized_series().cast(&DataType::String)?;
    let cells: Vec<Option<&str>> = as_text.str()?.into_iter().collect();
    let cats = categories(source.as_materialized_series())?;

    let mut indicators = Vec::with_capacity(cats.len());
    let mut names = Vec::with_capacity(cats.len());
    for category in &cats {
        let name = format!("{prefix}_{category}");
        let values: Vec<f64> = cells
            .iter()
            .map(|cell| if *cell == Some(category.as_str()) { 1.0 } else { 0.0 })
            .collect();
        indicators.push(Series::new(name.as_str().into(), values).into_column());
        names.push(name);
    }

    let encoded = df.drop(column)?.hstack(&indicators)?;
    Ok((encoded, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn crops() -> DataFrame {
        df!(
            "Temperatura" => &[25.0, 22.0, 30.0],
            "Cultura" => &[Some("SOJA"), Some("MILHO"), None],
        )
        .unwrap()
    }

    #[test]
    fn test_one_hot_creates_sorted_indicators() {
        let (encoded, names) = one_hot(&crops(), "Cultura", "Cultura").unwrap();

        assert_eq!(names, vec!["Cultura_MILHO", "Cultura_SOJA"]);
        let columns: Vec<String> = encoded
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(columns, vec!["Temperatura", "Cultura_MILHO", "Cultura_SOJA"]);

        let soja: Vec<Option<f64>> = encoded
            .column("Cultura_SOJA")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(soja, vec![Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_one_hot_absent_column_is_noop() {
        let df = crops();
        let (encoded, names) = one_hot(&df, "Estágio Fenológico", "Estagio").unwrap();
        assert!(names.is_empty());
        assert_eq!(encoded.width(), df.width());
    }

    #[test]
    fn test_categories() {
        let series = Series::new("c".into(), &["b", "a", "b"]);
        assert_eq!(categories(&series).unwrap(), vec!["a", "b"]);
    }
}
