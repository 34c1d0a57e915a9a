//! Keel 工具集
//!
//! 目前只提供日志初始化：demo 和测试共用同一套输出格式。

pub mod init_log;
