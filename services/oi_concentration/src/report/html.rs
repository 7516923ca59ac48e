use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCell {
    pub text: String,
    pub header: bool,
    pub rowspan: usize,
    pub colspan: usize,
}

impl ParsedCell {
    pub fn data(text: &str) -> Self {
        Self {
            text: text.to_string(),
            header: false,
            rowspan: 1,
            colspan: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    pub cells: Vec<ParsedCell>,
}

impl ParsedRow {
    pub fn from_texts(texts: &[&str]) -> Self {
        Self {
            cells: texts.iter().map(|t| ParsedCell::data(t)).collect(),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.text.clone()).collect()
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.cells.iter().position(|c| c.text.contains(needle))
    }
}

fn span_attr(el: &ElementRef, name: &str) -> usize {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

fn cell_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every `<tr>` in document order with its direct `<td>`/`<th>` children.
pub fn parse_rows(html: &str) -> Vec<ParsedRow> {
    let document = Html::parse_document(html);
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .map(|row| {
            let cells = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| matches!(el.value().name(), "td" | "th"))
                .map(|el| ParsedCell {
                    text: cell_text(&el),
                    header: el.value().name() == "th",
                    rowspan: span_attr(&el, "rowspan"),
                    colspan: span_attr(&el, "colspan"),
                })
                .collect();
            ParsedRow { cells }
        })
        .filter(|row: &ParsedRow| !row.cells.is_empty())
        .collect()
}

/// Visible text, one trimmed text node per line.
pub fn page_text(html: &str) -> String {
    Html::parse_document(html)
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_reads_spans_and_headers() {
        let html = r#"<table>
            <tr><th rowspan="2">契約名稱</th><th colspan="4">買方</th></tr>
            <tr><td rowspan="3"> 臺積電
                期貨 </td><td>1,234</td></tr>
            <tr></tr>
        </table>"#;
        let rows = parse_rows(html);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].cells[0].header);
        assert_eq!(rows[0].cells[0].rowspan, 2);
        assert_eq!(rows[0].cells[1].colspan, 4);
        assert_eq!(rows[1].cells[0].text, "臺積電 期貨");
        assert_eq!(rows[1].cells[0].rowspan, 3);
        assert!(!rows[1].cells[0].header);
    }

    #[test]
    fn test_nested_table_cells_are_not_flattened_into_parent() {
        let html = "<table><tr><td>outer<table><tr><td>inner</td></tr></table></td><td>2</td></tr></table>";
        let rows = parse_rows(html);
        assert_eq!(rows[0].cells.len(), 2);
        assert_eq!(rows[1].texts(), vec!["inner".to_string()]);
    }

    #[test]
    fn test_page_text_lines() {
        let text = page_text("<html><body><h3> 標題 </h3><p>日期：<span>2025/01/10</span></p></body></html>");
        assert_eq!(text, "標題\n日期：\n2025/01/10");
    }
}
