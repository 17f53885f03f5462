//! lazybind - 简单使用示例
//!
//! 同步容器：常量、带依赖的构造器、记忆化函数、请求中间件。
//! 异步容器：异步值、带超时的异步函数。

use lazybind::logging::{init_logging, LoggingConfig};
use lazybind::{
    deps, memoize, none, singleton, Args, BindingOptions, BoxError, ContainerBuilder,
    ContainerError,
};
use std::sync::Arc;
use std::time::Duration;

// 示例服务结构
#[derive(Debug)]
struct Config {
    app_name: String,
    version: String,
}

#[derive(Debug)]
struct Logger {
    app_name: String,
}

impl Logger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.app_name, message);
    }
}

#[derive(Debug)]
struct DatabaseService {
    config: Arc<Config>,
    logger: Arc<Logger>,
}

impl DatabaseService {
    fn connect(&self) {
        self.logger.log(&format!(
            "connecting to database for {} v{}",
            self.config.app_name, self.config.version
        ));
    }
}

fn sync_demo() -> lazybind::Result<()> {
    let mut builder = ContainerBuilder::new();
    builder
        .bind_value(
            "config",
            Config {
                app_name: "demo".to_string(),
                version: "1.0.0".to_string(),
            },
        )?
        .bind_constructor(
            "logger",
            |args| {
                Ok(Logger {
                    app_name: args.get::<Config>(0)?.app_name.clone(),
                })
            },
            deps(["config"]),
            singleton(),
        )?
        .bind_constructor(
            "database",
            |args| {
                Ok(DatabaseService {
                    config: args.get::<Config>(0)?,
                    logger: args.get::<Logger>(1)?,
                })
            },
            deps(["config", "logger"]),
            singleton(),
        )?
        .bind_function(
            "banner",
            |args| {
                let config = args.get::<Config>(0)?;
                Ok(format!("{} v{}", config.app_name, config.version))
            },
            deps(["config"]),
            memoize(),
        )?;
    builder.map::<String, _>("banner", |banner| format!("*** {} ***", banner));

    let provider = builder.build(["database", "banner"])?;

    provider.get_as::<DatabaseService>("database")?.connect();
    println!("{}", provider.get_as::<String>("banner")?);
    println!("{}", provider.get_as::<String>("banner")?);
    println!("{}", provider.stats().performance_summary());
    Ok(())
}

async fn async_demo() -> lazybind::Result<()> {
    let mut builder = ContainerBuilder::new_async();
    builder
        .bind_async_value(
            "token",
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                "secret-token".to_string()
            },
            Some(Duration::from_millis(500)),
        )?
        .bind_async_function(
            "profile",
            |args: Args| async move {
                let token = args.get::<String>(0)?;
                Ok::<_, BoxError>(format!("profile loaded with {}", token))
            },
            deps(["token"]),
            BindingOptions::default().memoize().timeout(Duration::from_millis(200)),
        )?
        .bind_async_value("stuck", std::future::pending::<u8>(), Some(Duration::from_millis(20)))?
        .bind_function("unused", |_| Ok(()), none(), BindingOptions::default())?;

    let provider = builder.build(["profile", "stuck"])?;
    println!("{}", provider.get_as_async::<String>("profile").await?);

    match provider.get_async("stuck").await {
        Err(ContainerError::Timeout { name, timeout }) => {
            println!("{} timed out after {:?}", name, timeout)
        }
        other => println!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_logging(LoggingConfig::development())?;

    println!("=== sync container ===");
    sync_demo()?;

    println!("=== async container ===");
    async_demo().await?;
    Ok(())
}
