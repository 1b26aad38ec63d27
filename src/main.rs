//! 程序入口：初始化日志、加载词表，按子命令调用存储与视图接口

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use duoyu_cibiao::model::config::StoreConfig;
use duoyu_cibiao::model::performance::run_performance_suite;
use duoyu_cibiao::utils::persistence::{FileSnapshot, BUNDLED_SEED};
use duoyu_cibiao::vm::bridge::{STATUS_LOADED, STATUS_UNSAVED};
use duoyu_cibiao::{EditSession, LocalizationStore};

#[derive(Parser)]
#[command(name = "duoyu_cibiao")]
#[command(about = "多语言词表调试工具", long_about = None)]
struct Cli {
    /// 快照文件路径（覆盖配置）
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// JSON配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 新建词表时的默认语言名
    #[arg(long)]
    default_language: Option<String>,

    /// 首次运行不使用内置示例词表
    #[arg(long)]
    no_seed: bool,

    /// 修改后不自动保存
    #[arg(long)]
    no_autosave: bool,

    /// 日志详细程度（-v, -vv）
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 以当前语言列出所有词条（缺失时显示默认语言）
    Show,
    /// 按默认语言词条查询翻译
    Get { word: String },
    /// 切换当前语言
    Select { index: usize },
    /// 添加语言
    AddLanguage { name: String },
    /// 删除语言（默认语言不可删除）
    RemoveLanguage { index: usize },
    /// 向默认语言添加词条
    AddWord { word: String },
    /// 删除一行
    RemoveWord { row: usize },
    /// 写入单元格
    Set {
        language: usize,
        row: usize,
        value: String,
    },
    /// 在默认语言中搜索
    Search {
        text: String,
        #[arg(long)]
        case_sensitive: bool,
    },
    /// 按语言列过滤，列出可见行
    Filter { language: usize, text: String },
    /// 拖动一行到新位置
    Move { from: usize, to: usize },
    /// 立即保存
    Save,
    /// 运行性能测试
    Bench,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(file) = &cli.file {
        config.snapshot_path = file.clone();
    }
    if let Some(name) = &cli.default_language {
        config.default_language_name = name.trim().to_string();
    }
    if cli.no_seed {
        config.use_bundled_seed = false;
    }
    if cli.no_autosave {
        config.autosave = false;
    }
    if config.default_language_name.is_empty() {
        bail!("默认语言名不能为空");
    }
    Ok(config)
}

fn print_all_words(store: &LocalizationStore) {
    let selected = store.selected_language();
    println!(
        "当前语言: {} ({})",
        store.language_name(selected).unwrap_or("?"),
        selected
    );
    for row in 0..store.row_count() {
        println!(
            "{:>4}: {} -> {}",
            row,
            store.word_at(0, row).unwrap_or(""),
            store.get_by_index(row)
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let provider = FileSnapshot::new(&config.snapshot_path);
    let seed = config.use_bundled_seed.then(|| BUNDLED_SEED.as_bytes());
    let (mut store, source) =
        LocalizationStore::load_or_create(&provider, seed, &config.default_language_name);
    let mut session = EditSession::new();
    tracing::debug!("{}: {:?}", STATUS_LOADED, source);

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => print_all_words(&store),
        Commands::Get { word } => println!("{}", store.get(&word)),
        Commands::Select { index } => {
            if !store.set_selected_language(index) {
                bail!("语言索引越界: {}", index);
            }
            print_all_words(&store);
        }
        Commands::AddLanguage { name } => match store.add_language(name.trim()) {
            Some(index) => println!("已添加语言 {} (索引 {})", name.trim(), index),
            None => bail!("语言名不能为空"),
        },
        Commands::RemoveLanguage { index } => {
            session
                .remove_language(&mut store, index)
                .with_context(|| format!("删除语言失败: {}", index))?;
            println!("已删除语言 {}", index);
        }
        Commands::AddWord { word } => {
            let row = store.add_word_to_default(&word);
            println!("已添加第 {} 行: {}", row, word);
        }
        Commands::RemoveWord { row } => {
            if !store.remove_word_at(row) {
                bail!("行号越界: {}", row);
            }
            println!("已删除第 {} 行", row);
        }
        Commands::Set {
            language,
            row,
            value,
        } => {
            if !store.set_word_at(language, row, &value) {
                tracing::warn!("单元格未修改: 语言 {} 行 {}", language, row);
            }
        }
        Commands::Search {
            text,
            case_sensitive,
        } => {
            for (row, word) in store.search_in_default(&text, case_sensitive) {
                println!("{:>4}: {}", row, word);
            }
        }
        Commands::Filter { language, text } => {
            session.set_filter(&store, language, &text);
            let view = session.view(&store);
            for (pos, row) in view.rows().iter().enumerate() {
                println!(
                    "{:>4} [{}]: {}",
                    pos,
                    row,
                    store.word_at(session.filter_language(), *row).unwrap_or("")
                );
            }
        }
        Commands::Move { from, to } => {
            session
                .move_row(&mut store, from, to)
                .with_context(|| format!("移动失败: {} -> {}", from, to))?;
            print_all_words(&store);
        }
        Commands::Save => {
            session
                .save(&mut store, &provider)
                .context("保存词表失败")?;
        }
        Commands::Bench => {
            for result in run_performance_suite() {
                println!(
                    "[{}] {} {}ms - {}",
                    if result.success { "OK" } else { "FAIL" },
                    result.operation,
                    result.duration_ms,
                    result.details
                );
            }
        }
    }

    if store.is_dirty() && config.autosave {
        session
            .save(&mut store, &provider)
            .context("保存词表失败")?;
    } else if store.is_dirty() {
        tracing::info!("{}", STATUS_UNSAVED);
    }
    Ok(())
}
