use super::super::domain::Evaluation;
use super::summary::EvaluationReport;
use serde::Serialize;
use std::io::Write;

/// One CSV line per evaluation in the reported period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Evaluation ID")]
    pub evaluation_id: String,
    #[serde(rename = "Employee")]
    pub employee: String,
    #[serde(rename = "Period")]
    pub period: String,
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Final Grade")]
    pub final_grade: String,
    #[serde(rename = "Completed At")]
    pub completed_at: String,
}

impl From<&Evaluation> for ReportRow {
    fn from(record: &Evaluation) -> Self {
        Self {
            evaluation_id: record.id.0.clone(),
            employee: record.employee.0.clone(),
            period: record.period.clone(),
            status: record.status.as_str(),
            final_grade: record
                .final_grade()
                .map(|grade| grade.as_str().to_string())
                .unwrap_or_default(),
            completed_at: record
                .completed_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

impl EvaluationReport {
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
