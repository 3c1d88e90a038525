use std::sync::Arc;
use tracing::info;

use crate::cli::ConvertArgs;
use projection::config::OutputConfig;
use projection::{ConvertError, Filter, Framework, Listener};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn convert(
    framework: &Framework,
    args: ConvertArgs,
    defaults: &OutputConfig,
) -> Result<(), AnyError> {
    let format = args.format.unwrap_or(defaults.format);
    let mut options = defaults.options();
    if args.quality.is_some() {
        options.quality = args.quality;
    }
    if args.compression.is_some() {
        options.compression = args.compression;
    }

    info!(
        source = %args.source,
        targets = args.targets.len(),
        %format,
        "Starting conversion"
    );

    if args.filters.is_empty() {
        match args.targets.as_slice() {
            [target] => {
                framework
                    .convert_with(&args.source, target, format, Some(options))
                    .await?
            }
            targets => {
                framework
                    .convert_all_with(&args.source, targets, format, Some(options))
                    .await?
            }
        }
    } else {
        run_filtered(framework, &args, format, options).await?;
    }

    for target in &args.targets {
        info!(output = %target, "Wrote {}", target.location());
    }
    Ok(())
}

/// Filters are not part of the facade, so build the pipelines directly
async fn run_filtered(
    framework: &Framework,
    args: &ConvertArgs,
    format: projection::Format,
    options: projection::EncodingOptions,
) -> Result<(), ConvertError> {
    let filters: Vec<Arc<dyn Filter>> = args
        .filters
        .iter()
        .map(|filter| Arc::new(*filter) as Arc<dyn Filter>)
        .collect();
    let listener: Arc<dyn Listener> = Arc::new(framework.save_listener(format, Some(options)));

    let conversions = framework
        .converter()
        .create_conversions(&args.source, &args.targets, &filters)
        .await?;
    for mut conversion in conversions {
        conversion.add_listener(listener.clone());
        conversion.run().await?;
    }
    Ok(())
}

pub fn types(framework: &Framework) {
    for type_id in framework.registered_types() {
        println!("{type_id}");
    }
}
