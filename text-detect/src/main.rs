use std::num::IntErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image_proc::{BoxStyle, annotate_file};
use ocr::{DetectionOptions, Granularity, TesseractConfig, TesseractEngine, TrailingRow};
use text_detect::report::{OutputFormat, OutputPlan, write_detections};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 命令行参数：输入图像、输出位置与后处理阈值。
#[derive(Parser, Debug)]
#[command(
    name = "text-detect",
    version,
    about = "使用 Tesseract 识别图像中的文字，过滤低置信度结果并可合并为整行"
)]
struct Args {
    /// 待识别的输入图像
    #[arg(short, long)]
    image: PathBuf,

    /// 输出目录，默认与输入图像相同
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 结果文件格式
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Csv)]
    file_format: OutputFormat,

    /// 最低置信度（0-100，超出范围会被截断）
    #[arg(
        short,
        long = "min-conf",
        default_value_t = 0,
        allow_negative_numbers = true,
        value_parser = parse_saturating
    )]
    min_conf: i64,

    /// 输出整行文字
    #[arg(long, overrides_with = "word")]
    line: bool,

    /// 输出单词（默认）
    #[arg(long, overrides_with = "line")]
    word: bool,

    /// 同一行内相邻单词的最大间距（0-20，仅在 --line 时使用）
    #[arg(
        short,
        long,
        default_value_t = 10,
        allow_negative_numbers = true,
        value_parser = parse_saturating
    )]
    distance: i64,

    /// 判定为同一行时允许的 top 偏差（像素）
    #[arg(long, default_value_t = 0)]
    row_tolerance: u32,

    /// 丢弃最后一行，复现旧版输出
    #[arg(long, default_value_t = false)]
    drop_trailing_row: bool,

    /// Tesseract 语言代码，例如 eng 或 eng+deu
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Tesseract 页面分割模式（--psm）
    #[arg(long)]
    psm: Option<u32>,

    /// tesseract 可执行文件路径
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

/// 解析整数参数；超出 i64 范围的数值饱和到边界，随后再按业务范围截断。
fn parse_saturating(value: &str) -> Result<i64, String> {
    match value.trim().parse::<i64>() {
        Ok(v) => Ok(v),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(format!("不是有效的整数：{value}")),
        },
    }
}

impl Args {
    fn granularity(&self) -> Granularity {
        if self.line && !self.word {
            Granularity::Row
        } else {
            Granularity::Word
        }
    }

    fn detection_options(&self) -> DetectionOptions {
        let trailing_row = if self.drop_trailing_row {
            TrailingRow::Drop
        } else {
            TrailingRow::Emit
        };
        DetectionOptions::default()
            .with_granularity(self.granularity())
            .with_min_confidence(self.min_conf)
            .with_max_gap(self.distance)
            .with_row_tolerance(self.row_tolerance)
            .with_trailing_row(trailing_row)
    }

    fn tesseract_config(&self) -> TesseractConfig {
        let config = TesseractConfig::default()
            .with_executable(&self.tesseract)
            .with_language(self.lang.clone());
        match self.psm {
            Some(psm) => config.with_page_segmentation_mode(psm),
            None => config,
        }
    }
}

/// 程序入口：解析参数并执行识别流程。
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 校验路径、运行 OCR、后处理，并写出标注图像与结果文件。
fn run(args: Args) -> Result<()> {
    let plan = OutputPlan::resolve(&args.image, args.output.as_deref(), args.file_format)?;
    let options = args.detection_options();
    info!(?options, image = %plan.image().display(), "开始识别");

    let engine = TesseractEngine::new(args.tesseract_config());
    let detections = ocr::detect_text(&engine, plan.image(), options)
        .with_context(|| format!("识别失败：{}", plan.image().display()))?;

    annotate_file(
        plan.image(),
        plan.annotated_image(),
        &detections,
        BoxStyle::default(),
    )?;
    write_detections(&plan, &detections, options.granularity())?;

    println!(
        "完成识别：{} 条{}结果，结果文件：{}，标注图像：{}",
        detections.len(),
        match options.granularity() {
            Granularity::Word => "单词",
            Granularity::Row => "整行",
        },
        plan.results().display(),
        plan.annotated_image().display()
    );

    Ok(())
}
