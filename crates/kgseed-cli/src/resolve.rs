//! `kgseed resolve`: one request from the command line.

use crate::output;
use crate::ResolveArgs;
use anyhow::{anyhow, Context, Result};
use kgseed_core::types::type_set;
use kgseed_core::{ImageSource, SeedEngine, SeedInput, SeedRequest};

pub fn request_from_args(args: &ResolveArgs) -> Result<SeedRequest> {
    let input = if let Some(text) = &args.text {
        SeedInput::Text(text.clone())
    } else if let Some(url) = &args.url {
        SeedInput::Url(url.clone())
    } else if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        SeedInput::Image(ImageSource::Bytes(bytes))
    } else if let Some(uri) = &args.image_url {
        SeedInput::Image(ImageSource::Remote(uri.clone()))
    } else {
        return Err(anyhow!("one of --text, --url, --image or --image-url is required"));
    };

    Ok(SeedRequest {
        input,
        types: type_set(&args.types),
        limit: args.limit,
        best_only: args.best_only,
        raw: args.raw,
    })
}

pub async fn cmd_resolve(engine: &SeedEngine, args: &ResolveArgs) -> Result<()> {
    let request = request_from_args(args)?;
    let response = engine
        .resolve_seeds(request)
        .await
        .context("seed resolution failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output::response_json(&response))?);
    } else {
        print!("{}", output::render_colored(&response));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgseed_core::SchemaType;
    use std::path::PathBuf;

    fn args() -> ResolveArgs {
        ResolveArgs {
            text: None,
            url: None,
            image: None,
            image_url: None,
            types: Vec::new(),
            limit: None,
            best_only: false,
            raw: false,
            json: false,
            policy: None,
        }
    }

    #[test]
    fn text_request_carries_flags() {
        let request = request_from_args(&ResolveArgs {
            text: Some("Madrid".into()),
            types: vec!["schema:City".into(), "Place".into()],
            limit: Some(3),
            best_only: true,
            ..args()
        })
        .unwrap();

        assert_eq!(request.input, SeedInput::Text("Madrid".into()));
        assert!(request.types.contains(&SchemaType::new("City")));
        assert_eq!(request.types.len(), 2);
        assert_eq!(request.limit, Some(3));
        assert!(request.best_only);
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(request_from_args(&args()).is_err());
    }

    #[test]
    fn unreadable_image_is_an_error() {
        let err = request_from_args(&ResolveArgs {
            image: Some(PathBuf::from("/nonexistent/picture.jpg")),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("failed to read image"));
    }
}
