use clap::ValueEnum;

pub mod commands;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        }
    }
}

/// Quote a field for table (CSV) output when it holds a comma, quote or newline
pub fn csv_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_plain_value_unchanged() {
        assert_eq!(csv_field("https://a.com/app.js"), "https://a.com/app.js");
    }

    #[test]
    fn test_csv_field_quotes_commas_and_quotes() {
        assert_eq!(
            csv_field("https://a.com/app.js?x=1,2"),
            "\"https://a.com/app.js?x=1,2\""
        );
        assert_eq!(csv_field(r#"Acme "Ads""#), r#""Acme ""Ads""""#);
    }
}
