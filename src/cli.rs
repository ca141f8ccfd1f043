//! Command-line arguments and their translation into a pipeline

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};

use site_extractor::config::Settings;
use site_extractor::error::ExtractError;
use site_extractor::extract::{ExtractOptions, ExtractionMode};
use site_extractor::fetch::BrowserOptions;
use site_extractor::output::{OutputFormat, OutputSpec};
use site_extractor::pipeline::Pipeline;
use site_extractor::selector::{Selector, SelectorLanguage};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "site-extractor",
    version,
    about = "Extract elements from a web page and save them to CSV or JSON"
)]
#[command(group(ArgGroup::new("query").required(true).args(["selector", "xpath", "css"])))]
#[command(group(ArgGroup::new("field").required(true).args(["attr", "text"])))]
pub struct Cli {
    /// Target page URL
    #[arg(long)]
    pub url: String,

    /// Selector; XPath if it starts with `/`, CSS otherwise
    #[arg(long)]
    pub selector: Option<String>,

    /// XPath expression (no inference)
    #[arg(long)]
    pub xpath: Option<String>,

    /// CSS selector (no inference)
    #[arg(long)]
    pub css: Option<String>,

    /// Attribute to extract (e.g. href, src, data-id)
    #[arg(long)]
    pub attr: Option<String>,

    /// Extract the element text
    #[arg(long)]
    pub text: bool,

    /// Output file (.csv or .json)
    #[arg(long, default_value = "results.csv")]
    pub output: PathBuf,

    /// Output format, overriding the file extension
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Render the page in headless Chromium before extracting
    #[arg(long, alias = "headless", env = "SITE_EXTRACTOR_RENDER_JS")]
    pub render_js: bool,

    /// Page load timeout in seconds
    #[arg(long, env = "SITE_EXTRACTOR_TIMEOUT", default_value_t = 20)]
    pub timeout: u64,

    /// User-Agent header / browser user agent
    #[arg(long, env = "SITE_EXTRACTOR_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Chromium or Chrome executable for --render-js
    #[arg(long, env = "SITE_EXTRACTOR_BROWSER")]
    pub browser: Option<PathBuf>,

    /// Extra browser switch, repeatable
    #[arg(long = "browser-arg", value_name = "ARG")]
    pub browser_args: Vec<String>,

    /// Resolve relative href/src values against the page URL
    #[arg(long)]
    pub absolute_urls: bool,

    /// Add a `tag` column with the element name
    #[arg(long)]
    pub include_tag: bool,

    /// Add an `html` column with the element's outer HTML
    #[arg(long)]
    pub include_html: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// More logging (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(3) as i8
        }
    }

    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            render_js: self.render_js,
            browser: BrowserOptions {
                executable: self.browser.clone(),
                args: self.browser_args.clone(),
            },
            extract: ExtractOptions {
                absolute_urls: self.absolute_urls,
                include_tag: self.include_tag,
                include_html: self.include_html,
                ..defaults.extract
            },
        }
    }

    pub fn selector(&self) -> Result<Selector, ExtractError> {
        let selector = match (&self.selector, &self.xpath, &self.css) {
            (Some(raw), _, _) => Selector::new(raw.as_str())?,
            (_, Some(raw), _) => Selector::with_language(raw.as_str(), SelectorLanguage::XPath)?,
            (_, _, Some(raw)) => Selector::with_language(raw.as_str(), SelectorLanguage::Css)?,
            (None, None, None) => Selector::new("")?,
        };
        Ok(selector)
    }

    pub fn mode(&self) -> ExtractionMode {
        match &self.attr {
            Some(name) => ExtractionMode::Attribute(name.clone()),
            None => ExtractionMode::Text,
        }
    }

    pub fn output_spec(&self) -> Result<OutputSpec, ExtractError> {
        Ok(match self.format {
            Some(format) => OutputSpec::new(self.output.clone(), format.into()),
            None => OutputSpec::from_path(self.output.clone())?,
        })
    }

    /// Validate the invocation and assemble the pipeline
    pub fn pipeline(&self) -> Result<Pipeline, ExtractError> {
        let settings = self.settings();
        let request = settings.fetch_request(&self.url)?;
        Ok(Pipeline::new(request, self.selector()?, self.mode(), self.output_spec()?)
            .with_options(settings.extract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use site_extractor::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["site-extractor"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_attr_and_text_are_exclusive() {
        let result = Cli::try_parse_from([
            "site-extractor",
            "--url",
            "https://example.com",
            "--selector",
            "a",
            "--attr",
            "href",
            "--text",
        ]);
        assert!(result.is_err());

        let result = Cli::try_parse_from([
            "site-extractor",
            "--url",
            "https://example.com",
            "--selector",
            "a",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_selector_flags() {
        let cli = parse(&[
            "--url",
            "https://example.com",
            "--selector",
            "//a",
            "--text",
        ]);
        assert_eq!(cli.selector().unwrap().language(), SelectorLanguage::XPath);

        let cli = parse(&[
            "--url",
            "https://example.com",
            "--xpath",
            "(//a)[1]",
            "--text",
        ]);
        assert_eq!(cli.selector().unwrap().language(), SelectorLanguage::XPath);

        let cli = parse(&[
            "--url",
            "https://example.com",
            "--css",
            "a.item",
            "--attr",
            "data-id",
        ]);
        assert_eq!(cli.selector().unwrap().language(), SelectorLanguage::Css);
        assert_eq!(cli.mode(), ExtractionMode::Attribute("data-id".to_string()));
    }

    #[test]
    fn test_output_extension_checked() {
        let cli = parse(&[
            "--url",
            "https://example.com",
            "--selector",
            "a",
            "--text",
            "--output",
            "out.txt",
        ]);
        assert_eq!(cli.pipeline().unwrap_err().kind(), ErrorKind::Config);

        let cli = parse(&[
            "--url",
            "https://example.com",
            "--selector",
            "a",
            "--text",
            "--output",
            "out.txt",
            "--format",
            "json",
        ]);
        assert_eq!(cli.output_spec().unwrap().format(), OutputFormat::Json);
    }

    #[test]
    fn test_headless_alias_and_settings() {
        let cli = parse(&[
            "--url",
            "https://example.com",
            "--selector",
            "a",
            "--attr",
            "href",
            "--headless",
            "--timeout",
            "5",
            "--absolute-urls",
        ]);
        let settings = cli.settings();
        assert!(settings.render_js);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert!(settings.extract.absolute_urls);
        assert_eq!(cli.verbosity(), 0);
    }
}
