//! JSON analysis report

use crate::error::{RagamError, Result};
use crate::pipeline::AnalysisReport;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// JSON output schema version
pub const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize, Deserialize)]
pub struct RagamJson {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: ExportMetadata,
    pub analysis: AnalysisJson,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// ragam version that generated this file
    pub generator_version: String,
    pub exported_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJson {
    pub input: String,
    /// `original`, a stem name, or `mix (<path>)`
    pub track: String,
    pub analyzed_path: String,
    pub tonic: String,
    pub raga: RagaJson,
    pub chords: ChordsJson,
    pub transcription: TranscriptionJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagaJson {
    pub number: u8,
    pub name: String,
    pub arohanam: String,
    pub avarohanam: String,
    pub overlap: usize,
    /// Tonic-relative offsets above the capture threshold
    pub captured: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordsJson {
    pub times: Vec<f64>,
    pub labels: Vec<String>,
    pub progression: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJson {
    /// `primary` or `fallback`
    pub strategy: String,
    pub backend: String,
    pub swaras: String,
    pub notes: Vec<NoteJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteJson {
    pub start: f64,
    pub end: f64,
    pub midi: u8,
    pub western: String,
    pub swara: String,
}

/// Write an analysis report as JSON
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn write_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    // Same directory, so the rename stays on one filesystem
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| RagamError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let output = RagamJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
        },
        analysis: report_to_json(report),
    };

    encode_report(file, &output).map_err(|reason| {
        let _ = std::fs::remove_file(&temp_path);
        RagamError::OutputError {
            path: output_path.to_path_buf(),
            reason,
        }
    })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        RagamError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!("Wrote analysis report to {}", output_path.display());
    Ok(())
}

/// Serialize through a buffer; the flush is explicit so write errors surface
fn encode_report<W: Write>(sink: W, output: &RagamJson) -> std::result::Result<(), String> {
    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, output).map_err(|e| e.to_string())?;
    writer.flush().map_err(|e| format!("Failed to flush report: {}", e))
}

pub fn report_to_json(report: &AnalysisReport) -> AnalysisJson {
    let raga = report.raga.raga;
    AnalysisJson {
        input: report.input.to_string_lossy().to_string(),
        track: report.track.to_string(),
        analyzed_path: report.analyzed_path.to_string_lossy().to_string(),
        tonic: report.tonic.to_string(),
        raga: RagaJson {
            number: raga.number,
            name: raga.name.to_string(),
            arohanam: raga.arohanam.to_string(),
            avarohanam: raga.avarohanam.to_string(),
            overlap: report.raga.overlap,
            captured: report.raga.captured.clone(),
        },
        chords: ChordsJson {
            times: report.chords.times.clone(),
            labels: report.chords.labels.iter().map(ToString::to_string).collect(),
            progression: report.progression().iter().map(ToString::to_string).collect(),
        },
        transcription: TranscriptionJson {
            strategy: report.transcription.produced_by.to_string(),
            backend: report.transcription.backend.to_string(),
            swaras: report.swara_sequence(),
            notes: report
                .notes
                .iter()
                .map(|row| NoteJson {
                    start: row.start,
                    end: row.end,
                    midi: row.midi,
                    western: row.western.clone(),
                    swara: row.swara.to_string(),
                })
                .collect(),
        },
    }
}
