use anyhow::Context as _;

use super::Context;

pub fn run(ctx: &Context, port: Option<u16>, open: bool) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let port = port.unwrap_or(config.server.port);
    let open_browser = open || config.server.open_browser;

    let rt = tokio::runtime::Runtime::new()?;
    let root = ctx.root.clone();
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        let actual_port = listener.local_addr()?.port();
        println!("devflow → http://localhost:{actual_port}  (PID {})", std::process::id());

        tokio::select! {
            res = devflow_server::serve_on(&root, listener, open_browser) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
