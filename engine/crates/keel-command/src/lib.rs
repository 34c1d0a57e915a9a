//! 命令录制与提交
//!
//! [`commands::command_context::GfxCommandContext`] 在录制每条命令前向状态追踪器请求资源状态，
//! 把返回的 barrier 插到命令之前；[`commands::command_queue::GfxCommandQueue`] 在提交时
//! 拼接多个命令列表，补上序言和桥接 barrier，并在顺序确定后提交资源的最终状态。
//!
//! 这里的命令只记录在内存里，不调用任何原生 API。

pub mod commands;
