use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::AppError;

/// Classifier output index to sign name, read-only after startup.
#[derive(Debug, Clone, Default)]
pub struct SignLabelTable {
    labels: HashMap<usize, String>,
}

impl SignLabelTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::Labels(format!("{}: {}", path.display(), e)))?;
        let table = Self::parse(&contents)?;
        info!("Loaded {} sign labels from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses `sign_ord,sign` rows. A header line, when present, names the two
    /// columns and may list them in any order.
    pub fn parse(contents: &str) -> Result<Self, AppError> {
        let mut rows = contents
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .peekable();

        let mut columns = (0, 1);
        if let Some((_, first)) = rows.peek() {
            let fields = split_fields(first);
            if fields.first().is_some_and(|f| f.parse::<usize>().is_err()) {
                columns = header_columns(&fields)?;
                rows.next();
            }
        }
        let (ord_column, sign_column) = columns;

        let mut labels = HashMap::new();
        for (line_number, line) in rows {
            let fields = split_fields(line);
            let (Some(ord), Some(sign)) = (fields.get(ord_column), fields.get(sign_column)) else {
                return Err(AppError::Labels(format!(
                    "line {}: expected `id,label`",
                    line_number
                )));
            };
            let ord = ord.parse::<usize>().map_err(|_| {
                AppError::Labels(format!("line {}: `{}` is not a label id", line_number, ord))
            })?;
            if labels.insert(ord, sign.to_string()).is_some() {
                return Err(AppError::Labels(format!(
                    "line {}: duplicate label id {}",
                    line_number, ord
                )));
            }
        }
        if labels.is_empty() {
            return Err(AppError::Labels("no labels found".to_string()));
        }
        Ok(Self { labels })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(ord, sign)| (ord, sign.into()))
                .collect(),
        }
    }

    pub fn get(&self, ord: usize) -> Option<&str> {
        self.labels.get(&ord).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"'))
        .collect()
}

fn header_columns(fields: &[&str]) -> Result<(usize, usize), AppError> {
    let find = |name: &str| {
        fields
            .iter()
            .position(|field| *field == name)
            .ok_or_else(|| AppError::Labels(format!("header has no `{}` column", name)))
    };
    Ok((find("sign_ord")?, find("sign")?))
}
