//! CSV export of (optionally filtered) draw records.

use std::io::Write;

use extracto_core::catalog::organization_name;
use extracto_core::{AggregatedDataset, DrawDate, RecordFilter};
use extracto_sync::DrawQuery;

const HEADER: [&str; 7] = [
    "Posicion",
    "Numero",
    "Fecha",
    "Jurisdiccion",
    "Modalidad",
    "Organizacion",
    "Imputacion",
];

const NO_DATA_NOTE: &str = "No hay resultados para los filtros seleccionados";

pub struct ExportContext {
    pub query: DrawQuery,
    pub from: DrawDate,
    /// `None` for a single-date export.
    pub to: Option<DrawDate>,
    pub filter: RecordFilter,
}

fn file_label(label: &str) -> String {
    label.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// `resultados_{org}_{class}_{from}[_al_{to}][_{jurisdiction}][_{modality}].csv`
pub fn default_file_name(ctx: &ExportContext) -> String {
    let mut name = format!(
        "resultados_{}_{}_{}",
        ctx.query.organization,
        ctx.query.classification,
        ctx.from.file_stem()
    );
    if let Some(to) = ctx.to
        && to != ctx.from
    {
        name.push_str(&format!("_al_{}", to.file_stem()));
    }
    if let Some(j) = &ctx.filter.jurisdiction {
        name.push_str(&format!("_{}", file_label(j)));
    }
    if let Some(m) = &ctx.filter.modality {
        name.push_str(&format!("_{}", file_label(m)));
    }
    name.push_str(".csv");
    name
}

/// Write the filtered records of `dataset` as CSV. Returns the number of
/// records written; an empty selection still gets a single placeholder row.
pub fn write_csv<W: Write>(
    writer: W,
    dataset: &AggregatedDataset,
    ctx: &ExportContext,
) -> anyhow::Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    let organization = organization_name(ctx.query.organization);
    let classification = ctx.query.classification.to_string();
    let filtered = dataset.filter(&ctx.filter);

    for r in filtered.records() {
        out.write_record([
            r.position().to_string().as_str(),
            r.value(),
            r.date().to_string().as_str(),
            r.jurisdiction().unwrap_or(""),
            r.modality().unwrap_or(""),
            organization,
            classification.as_str(),
        ])?;
    }

    if filtered.is_empty() {
        out.write_record(["Sin datos", "", "", "", "", "", NO_DATA_NOTE])?;
    }

    out.flush()?;
    Ok(filtered.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extracto_core::{DrawEntry, DrawRecord};

    fn ctx(filter: RecordFilter, to: Option<&str>) -> ExportContext {
        ExportContext {
            query: DrawQuery::new(1, 0),
            from: "01/01/2024".parse().unwrap(),
            to: to.map(|t| t.parse().unwrap()),
            filter,
        }
    }

    fn dataset() -> AggregatedDataset {
        let rec = |v: &str, p: u32, tipo: &str, modal: &str| {
            DrawRecord::stamp(
                DrawEntry::new(v, p, Some(tipo.into()), Some(modal.into())).unwrap(),
                "01/01/2024".parse().unwrap(),
            )
        };
        AggregatedDataset::from_records(vec![
            rec("1425", 1, "Neuquén", "Nocturna"),
            rec("0007", 2, "Neuquén", "Matutina"),
            rec("9999", 1, "Río Negro", "Nocturna"),
        ])
    }

    fn rows(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::Reader::from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn writes_header_and_records() {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &dataset(), &ctx(RecordFilter::default(), None)).unwrap();
        assert_eq!(n, 3);

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Posicion,Numero,Fecha,Jurisdiccion,Modalidad,Organizacion,Imputacion\n"));

        let rows = rows(&buf);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], ["2", "0007", "01/01/2024", "Neuquén", "Matutina", "Neuquén", "0"]);
    }

    #[test]
    fn applies_filters() {
        let filter = RecordFilter {
            jurisdiction: Some("Neuquén".into()),
            modality: Some("Nocturna".into()),
        };
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &dataset(), &ctx(filter, None)).unwrap();
        assert_eq!(n, 1);
        assert_eq!(rows(&buf)[0][1], "1425");
    }

    #[test]
    fn empty_selection_writes_placeholder() {
        let filter = RecordFilter {
            jurisdiction: Some("Salta".into()),
            modality: None,
        };
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &dataset(), &ctx(filter, None)).unwrap();
        assert_eq!(n, 0);
        let rows = rows(&buf);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Sin datos");
        assert_eq!(rows[0][6], NO_DATA_NOTE);
    }

    #[test]
    fn file_names() {
        assert_eq!(
            default_file_name(&ctx(RecordFilter::default(), None)),
            "resultados_1_0_01-01-2024.csv"
        );
        assert_eq!(
            default_file_name(&ctx(RecordFilter::default(), Some("01/01/2024"))),
            "resultados_1_0_01-01-2024.csv"
        );
        let filter = RecordFilter {
            jurisdiction: Some("Río Negro".into()),
            modality: Some("La Primera".into()),
        };
        assert_eq!(
            default_file_name(&ctx(filter, Some("15/01/2024"))),
            "resultados_1_0_01-01-2024_al_15-01-2024_RoNegro_LaPrimera.csv"
        );
    }
}
