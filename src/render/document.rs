//! Printable gate pass document

use tabled::{builder::Builder, settings::Style};

use crate::entities::gate_pass::{GatePassLine, GatePassRecord};

/// Shown in place of a blank signatory
pub const BLANK_SIGNATURE: &str = "_______________";

/// Header lines for the printed document
#[derive(Debug, Clone)]
pub struct DocumentHeader<'a> {
    pub organization: &'a str,
    /// Origin of every line on the pass
    pub station: &'a str,
}

/// Item table with the columns of the paper form
pub fn line_table(lines: &[GatePassLine], station: &str, destination: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "S.No",
        "Mode of Transport",
        "Item Description",
        "Qty",
        "From",
        "To",
        "Type",
        "Remarks",
    ]);
    for (i, line) in lines.iter().enumerate() {
        let description = if line.description.is_empty() {
            line.name.clone()
        } else {
            line.description.clone()
        };
        builder.push_record([
            (i + 1).to_string(),
            line.transport.to_string(),
            description,
            line.selected_quantity.to_string(),
            station.to_string(),
            destination.to_string(),
            line.product_type.to_string(),
            line.remarks.clone(),
        ]);
    }
    builder.build().with(Style::modern()).to_string()
}

/// Render the full gate pass as plain text
pub fn render_gate_pass(record: &GatePassRecord, header: &DocumentHeader<'_>) -> String {
    let mut out = String::new();
    let width = 72;

    out.push_str(&center("Gate Pass", width));
    out.push('\n');
    out.push_str(&center(header.organization, width));
    out.push('\n');
    out.push_str(&center(&header.station.to_uppercase(), width));
    out.push('\n');
    out.push_str(&"=".repeat(width));
    out.push('\n');

    let number = format!("Gate Pass No: {}", record.gate_pass_number);
    let date = format!("Date: {}", record.date);
    let gap = width.saturating_sub(number.len() + date.len()).max(1);
    out.push_str(&format!("{}{}{}\n", number, " ".repeat(gap), date));
    out.push_str(&format!(
        "From: {}  ->  To: {}\n\n",
        header.station, record.to
    ));

    out.push_str(&line_table(&record.products, header.station, &record.to));
    out.push_str("\n\n");

    let signatories = [
        ("Prepared By", record.prepared_by.as_str()),
        ("Checked By", record.checked_by.as_str()),
        ("Authorized By", record.authorized_by.as_str()),
    ];
    let mut builder = Builder::default();
    builder.push_record(signatories.iter().map(|(role, _)| role.to_string()));
    builder.push_record(signatories.iter().map(|(_, name)| signature(name)));
    out.push_str(&builder.build().with(Style::blank()).to_string());
    out.push('\n');

    out.push_str(&format!(
        "Generated: {}\n",
        record.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out
}

fn signature(name: &str) -> String {
    if name.trim().is_empty() {
        BLANK_SIGNATURE.to_string()
    } else {
        name.to_string()
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::{ProductType, TransportMode};
    use chrono::{TimeZone, Utc};

    fn record() -> GatePassRecord {
        GatePassRecord {
            key: "k1".to_string(),
            gate_pass_number: "GP-0042".to_string(),
            date: "5/10/2026".to_string(),
            to: "Hyderabad GIS".to_string(),
            products: vec![
                GatePassLine {
                    product_id: "PRD-0001".to_string(),
                    name: "Surge Arrester".to_string(),
                    transport: TransportMode::MultiModal,
                    description: "198 kV arrester".to_string(),
                    selected_quantity: 3,
                    product_type: ProductType::Electronics,
                    remarks: "fragile".to_string(),
                },
                GatePassLine {
                    product_id: "PRD-0002".to_string(),
                    name: "Earthing Rod".to_string(),
                    transport: TransportMode::Road,
                    description: String::new(),
                    selected_quantity: 12,
                    product_type: ProductType::Industrial,
                    remarks: String::new(),
                },
            ],
            prepared_by: "A. Rao".to_string(),
            checked_by: String::new(),
            authorized_by: "C. Kumar".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_document_contents() {
        let header = DocumentHeader {
            organization: "POWER GRID CORPORATION OF INDIA Ltd",
            station: "Vemagiri GIS",
        };
        let doc = render_gate_pass(&record(), &header);

        assert!(doc.contains("Gate Pass No: GP-0042"));
        assert!(doc.contains("Date: 5/10/2026"));
        assert!(doc.contains("VEMAGIRI GIS"));
        assert!(doc.contains("Mode of Transport"));
        assert!(doc.contains("Multi-modal"));
        assert!(doc.contains("198 kV arrester"));
        // Lines without a description fall back to the product name
        assert!(doc.contains("Earthing Rod"));
        assert!(doc.contains("Hyderabad GIS"));
        assert!(doc.contains("A. Rao"));
        assert!(doc.contains("C. Kumar"));
        assert!(doc.contains(BLANK_SIGNATURE));
        assert!(doc.contains("2026-10-05 09:30 UTC"));
    }

    #[test]
    fn test_line_table_numbering() {
        let r = record();
        let table = line_table(&r.products, "Vemagiri GIS", &r.to);
        assert!(table.contains("S.No"));
        assert!(table.contains("│ 1 "));
        assert!(table.contains("│ 2 "));
        assert_eq!(table.matches("Vemagiri GIS").count(), 2);
    }
}
