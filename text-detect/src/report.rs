use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use ocr::{Detection, Granularity};
use serde::Serialize;
use thiserror::Error;

/// 结果文件的编码格式。
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 带表头的逐行表格。
    #[default]
    Csv,
    /// 对象数组，每个检测结果一条记录。
    Json,
}

impl OutputFormat {
    /// 宽松解析：无法识别的名称回退为 JSON。
    ///
    /// 供以库方式调用的代码使用；命令行通过 `ValueEnum` 限定取值，不会走到回退分支。
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            _ => Self::Json,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// 在开始识别之前就能发现的配置错误。
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("输入图像不存在或不是文件：{0}")]
    MissingImage(PathBuf),
    #[error("输出目录不存在或不是目录：{0}")]
    InvalidOutputDir(PathBuf),
}

/// 一次识别任务的输入与输出路径。
///
/// 输出文件命名为 `<原名>_output.<格式>` 与 `<原名>_output.<原扩展名>`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    image: PathBuf,
    results: PathBuf,
    annotated_image: PathBuf,
    format: OutputFormat,
}

impl OutputPlan {
    /// 校验输入图像与输出目录，并计算输出文件路径。
    ///
    /// - `output` 为空时使用输入图像所在目录。
    /// - 输入没有扩展名时，标注图像按 PNG 写出。
    pub fn resolve(
        image: &Path,
        output: Option<&Path>,
        format: OutputFormat,
    ) -> Result<Self, OutputError> {
        if !image.is_file() {
            return Err(OutputError::MissingImage(image.to_path_buf()));
        }
        let image = std::path::absolute(image)
            .map_err(|_| OutputError::MissingImage(image.to_path_buf()))?;

        let dir = match output {
            Some(dir) => dir.to_path_buf(),
            None => image
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        if !dir.is_dir() {
            return Err(OutputError::InvalidOutputDir(dir));
        }

        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let extension = image
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "png".to_string());

        Ok(Self {
            results: dir.join(format!("{stem}_output.{}", format.extension())),
            annotated_image: dir.join(format!("{stem}_output.{extension}")),
            image,
            format,
        })
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn results(&self) -> &Path {
        &self.results
    }

    pub fn annotated_image(&self) -> &Path {
        &self.annotated_image
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// 单词级记录，字段顺序即输出列顺序。
#[derive(Serialize)]
struct WordRecord<'a> {
    text: &'a str,
    confidence: Option<i32>,
    top: u32,
    left: u32,
    width: u32,
    height: u32,
}

/// 行级记录：没有置信度，文本列在最后。
#[derive(Serialize)]
struct RowRecord<'a> {
    top: u32,
    left: u32,
    width: u32,
    height: u32,
    text: &'a str,
}

const WORD_HEADER: [&str; 6] = ["text", "confidence", "top", "left", "width", "height"];
const ROW_HEADER: [&str; 5] = ["top", "left", "width", "height", "text"];

fn word_record(d: &Detection) -> WordRecord<'_> {
    WordRecord {
        text: &d.text,
        confidence: d.confidence,
        top: d.top,
        left: d.left,
        width: d.width,
        height: d.height,
    }
}

fn row_record(d: &Detection) -> RowRecord<'_> {
    RowRecord {
        top: d.top,
        left: d.left,
        width: d.width,
        height: d.height,
        text: &d.text,
    }
}

/// 写出 CSV。即使没有任何检测结果也会写出表头。
pub fn write_csv<W: Write>(
    writer: W,
    detections: &[Detection],
    granularity: Granularity,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    match granularity {
        Granularity::Word => {
            wtr.write_record(WORD_HEADER)?;
            for d in detections {
                wtr.serialize(word_record(d))?;
            }
        }
        Granularity::Row => {
            wtr.write_record(ROW_HEADER)?;
            for d in detections {
                wtr.serialize(row_record(d))?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// 写出 JSON 对象数组。
pub fn write_json<W: Write>(
    writer: W,
    detections: &[Detection],
    granularity: Granularity,
) -> Result<()> {
    match granularity {
        Granularity::Word => {
            let records: Vec<_> = detections.iter().map(word_record).collect();
            serde_json::to_writer(writer, &records)?;
        }
        Granularity::Row => {
            let records: Vec<_> = detections.iter().map(row_record).collect();
            serde_json::to_writer(writer, &records)?;
        }
    }
    Ok(())
}

/// 按计划中的格式将检测结果写入结果文件。
pub fn write_detections(
    plan: &OutputPlan,
    detections: &[Detection],
    granularity: Granularity,
) -> Result<()> {
    let path = plan.results();
    let file =
        File::create(path).with_context(|| format!("无法创建结果文件 {}", path.display()))?;
    let mut out = BufWriter::new(file);
    match plan.format() {
        OutputFormat::Csv => write_csv(&mut out, detections, granularity),
        OutputFormat::Json => write_json(&mut out, detections, granularity),
    }
    .with_context(|| format!("写入结果文件失败：{}", path.display()))?;
    out.flush()
        .with_context(|| format!("写入结果文件失败：{}", path.display()))?;
    Ok(())
}
