use std::io::Write;

/// 覆盖默认日志过滤规则的环境变量，语法同 `RUST_LOG`
///
/// 例如 `KEEL_LOG=info,keel_state_tracker=debug` 可以看到每一条 barrier。
pub const LOG_ENV: &str = "KEEL_LOG";

const DEFAULT_FILTER: &str = "info";

/// 环境变量为空或者没设置时退回默认的 `info`
fn resolve_filter(env_value: Option<String>) -> String {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn build_logger() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| {
        let info_style = buf
            .default_level_style(log::Level::Info)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green)));
        let warn_style = buf
            .default_level_style(log::Level::Warn)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
        let error_style = buf
            .default_level_style(log::Level::Error)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));
        let debug_style = buf
            .default_level_style(log::Level::Debug)
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Cyan)));

        let level_style = match record.level() {
            log::Level::Info => info_style,
            log::Level::Warn => warn_style,
            log::Level::Error => error_style,
            log::Level::Debug => debug_style,
            _ => buf.default_level_style(record.level()),
        };
        let grey_style = info_style.fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

        // barrier 日志来自哪个 crate 比来自哪一行更有用
        let target = record.target().split("::").next().unwrap_or("");
        let line = record.line().unwrap_or(!0);
        let time = chrono::Local::now().format("%H:%M:%S%.3f");
        let level = record.level();

        writeln!(
            buf,
            "{level_style}[{time}] {level:<5}{level_style:#} {grey_style}[{target}:{line}]{grey_style:#} {}",
            record.args()
        )
    });
    builder.parse_filters(&resolve_filter(std::env::var(LOG_ENV).ok()));
    builder
}

/// 初始化全局 logger，只能调用一次
pub fn init_log() {
    build_logger().init();
}

/// 测试里每个用例都可能调用，重复初始化直接忽略
pub fn try_init_log() {
    let _ = build_logger().is_test(true).try_init();
}
