// ==========================================
// 多厂区 MES 聚合系统 - 命令行入口
// ==========================================
// 用法:
//   fab-mes <lots|equipment|returns> [history|status] [fab]
//   fab-mes search <lots|equipment|returns> <keyword> [fab] [status]
//   fab-mes detail <lots|equipment|returns> <key>
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context};
use serde::Serialize;

use fab_mes::api::SearchRequest;
use fab_mes::app::AppState;
use fab_mes::config::AggregatorConfig;
use fab_mes::{logging, CallerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", fab_mes::APP_NAME, fab_mes::VERSION);
    tracing::info!("==================================================");

    let config = AggregatorConfig::load().context("加载配置失败")?;
    let state = AppState::new(config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize| args.get(i).map(String::as_str);
    let ctx = CallerContext::new(whoami());

    match (arg(0), arg(1)) {
        (Some("search"), Some(entity)) => {
            let keyword = arg(2).context("缺少关键字")?;
            let mut request = SearchRequest::keyword(keyword);
            request.fab = arg(3).map(str::to_string);
            request.status = arg(4).map(str::to_string);
            match entity {
                "lots" => print_json(&state.lot_api.search_lots(&request, &ctx).await?),
                "equipment" => print_json(&state.equipment_api.search_equipment(&request, &ctx).await?),
                "returns" => print_json(&state.return_api.search_returns(&request, &ctx).await?),
                other => bail!("未知实体: {}", other),
            }
        }
        (Some("detail"), Some(entity)) => {
            let key = arg(2).context("缺少业务主键")?;
            match entity {
                "lots" => print_json(&state.lot_api.get_lot_details(key, &ctx).await?),
                "equipment" => print_json(&state.equipment_api.get_equipment_details(key, &ctx).await?),
                "returns" => print_json(&state.return_api.get_return_details(key, &ctx).await?),
                other => bail!("未知实体: {}", other),
            }
        }
        (Some(entity), view) => {
            let active = matches!(view, Some("status"));
            let fab = arg(2);
            match (entity, active) {
                ("lots", false) => print_json(&state.lot_api.get_lot_history(fab, &ctx).await?),
                ("lots", true) => print_json(&state.lot_api.get_lot_status(fab, &ctx).await?),
                ("equipment", false) => {
                    print_json(&state.equipment_api.get_equipment_history(fab, &ctx).await?)
                }
                ("equipment", true) => {
                    print_json(&state.equipment_api.get_equipment_status(fab, &ctx).await?)
                }
                ("returns", false) => {
                    print_json(&state.return_api.get_return_history(fab, None, &ctx).await?)
                }
                ("returns", true) => print_json(&state.return_api.get_open_returns(fab, &ctx).await?),
                (other, _) => bail!("未知实体: {}", other),
            }
        }
        (None, _) => {
            eprintln!("用法: fab-mes <lots|equipment|returns> [history|status] [fab]");
            eprintln!("      fab-mes search <lots|equipment|returns> <keyword> [fab] [status]");
            eprintln!("      fab-mes detail <lots|equipment|returns> <key>");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "cli".to_string())
}
