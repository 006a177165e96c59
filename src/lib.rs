pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod search;
pub mod store;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use aggregate::{
    AreaLevel, area_summary, distinct_values, field_facets, geo_points, infra_profile, store_tree,
};
use config::DirectoryConfig;
use export::{ExportFormat, ExportOptions, export_page};
use model::{FieldSpec, InfraField, OrgField};
use search::filter::{LocationScope, filter_infra, filter_organizations};
use search::query::{ListingRequest, search_infra, search_organizations};
use store::{RecordStore, SharedStore, loader};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "orgdir",
    version,
    about = "Query an organization, location and infrastructure directory"
)]
pub struct Cli {
    /// Path to the config file (defaults to the XDG config dir)
    #[arg(long, global = true, env = "ORGDIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the row files (overrides `data.dir`)
    #[arg(long, global = true, env = "ORGDIR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output format for listings; aggregates are always JSON
    #[arg(long, global = true, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Field constraints shared by listings and aggregates.
///
/// Values are kept as raw strings: malformed numbers fall back to defaults
/// instead of failing the command.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Field constraint, repeatable; VALUES is comma separated
    #[arg(long = "filter", value_name = "FIELD=VALUES", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// How content-type selections combine (any|all)
    #[arg(long = "match", value_name = "MODE")]
    pub match_mode: Option<String>,

    /// Location scope for HQ fields (hq|all)
    #[arg(long)]
    pub scope: Option<String>,

    #[arg(long)]
    pub year_min: Option<String>,

    #[arg(long)]
    pub year_max: Option<String>,

    /// Restrict to owners of these location identities (comma separated)
    #[arg(long)]
    pub location_ids: Option<String>,
}

impl FilterArgs {
    fn params(&self) -> Vec<(&str, &str)> {
        let named = [
            ("contentTypesMatch", &self.match_mode),
            ("scope", &self.scope),
            ("yearMin", &self.year_min),
            ("yearMax", &self.year_max),
            ("locationIds", &self.location_ids),
        ];
        named
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
            .chain(self.filters.iter().map(|(f, v)| (f.as_str(), v.as_str())))
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.year_min.is_none()
            && self.year_max.is_none()
            && self.location_ids.is_none()
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListingArgs {
    /// Free-text name query
    #[arg(long, short)]
    pub query: Option<String>,

    #[arg(long)]
    pub page: Option<String>,

    #[arg(long)]
    pub page_size: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

impl ListingArgs {
    fn request<F: FieldSpec>(&self, default_page_size: usize) -> ListingRequest<F> {
        let mut params = self.filter.params();
        if let Some(q) = &self.query {
            params.push(("q", q.as_str()));
        }
        if let Some(page) = &self.page {
            params.push(("page", page.as_str()));
        }
        if let Some(size) = &self.page_size {
            params.push(("pageSize", size.as_str()));
        }
        ListingRequest::from_params(params, default_page_size as i64)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List organizations matching filters and an optional name query
    Search(ListingArgs),
    /// List infrastructure entries matching filters and an optional name query
    InfraSearch(ListingArgs),
    /// Region → country → city counts, optionally over a filtered subset
    Tree(FilterArgs),
    /// Geocoded locations, optionally over a filtered subset
    Points(FilterArgs),
    /// Counts and top countries/cities for one region or country
    Summary {
        /// region | country
        level: AreaLevel,
        name: String,
        /// Location scope (hq|all); anything else means hq
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Most common values of a field
    Facets {
        field: String,
        /// Count over the infrastructure catalog instead of organizations
        #[arg(long)]
        infra: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Every distinct value of a field, in display order
    Values {
        field: String,
        #[arg(long)]
        infra: bool,
    },
    /// One organization with its identifiers and locations
    Org { id: String },
    /// One infrastructure entry with its usage profile
    Infra {
        id: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (field, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUES, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), values.to_string()))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = execute(cli).await?;
    println!("{output}");
    Ok(())
}

/// Loads configuration and data, runs one command and returns its rendered output.
pub async fn execute(cli: Cli) -> Result<String> {
    let config = match &cli.config {
        Some(path) => DirectoryConfig::load_from(path),
        None => DirectoryConfig::load(),
    }
    .context("loading configuration")?;

    let paths = config
        .data
        .resolve(cli.data_dir.as_deref(), &default_data_dir());
    let store = loader::load_store(&paths)
        .await
        .with_context(|| format!("loading data from {}", paths.organizations.display()))?;
    let shared = SharedStore::new(store);

    dispatch(&shared.current(), &config, cli.format, cli.command)
}

/// Runs one command against a snapshot.
pub fn dispatch(
    store: &RecordStore,
    config: &DirectoryConfig,
    format: ExportFormat,
    command: Commands,
) -> Result<String> {
    let limits = &config.query;
    match command {
        Commands::Search(args) => {
            let req: ListingRequest<OrgField> = args.request(limits.default_page_size);
            let page = search_organizations(store, &req);
            tracing::debug!(format = format.name(), total = page.total, "search");
            Ok(export_page(&page, format, &export_options(&req.query)))
        }
        Commands::InfraSearch(args) => {
            let req: ListingRequest<InfraField> = args.request(limits.default_page_size);
            let page = search_infra(store, &req);
            tracing::debug!(format = format.name(), total = page.total, "infra_search");
            Ok(export_page(&page, format, &export_options(&req.query)))
        }
        Commands::Tree(filter) => {
            let subset = org_subset(store, &filter);
            to_json(&store_tree(store, subset.as_ref()))
        }
        Commands::Points(filter) => {
            let subset = org_subset(store, &filter);
            to_json(&geo_points(store, subset.as_ref()))
        }
        Commands::Summary {
            level,
            name,
            scope,
            limit,
        } => to_json(&area_summary(
            store,
            level,
            &name,
            scope
                .as_deref()
                .map(LocationScope::parse_or_default)
                .unwrap_or_default(),
            limit.unwrap_or(limits.summary_limit),
        )),
        Commands::Facets {
            field,
            infra,
            limit,
            filter,
        } => {
            let limit = limit.unwrap_or(limits.facet_limit);
            if infra {
                let field = lookup_field::<InfraField>(&field)?;
                let req: ListingRequest<InfraField> = ListingArgs {
                    filter,
                    ..Default::default()
                }
                .request(limits.default_page_size);
                let records = filter_infra(store, &req.filters);
                to_json(&field_facets(records, field, limit))
            } else {
                let field = lookup_field::<OrgField>(&field)?;
                let req: ListingRequest<OrgField> = ListingArgs {
                    filter,
                    ..Default::default()
                }
                .request(limits.default_page_size);
                let records = filter_organizations(store, &req.filters);
                to_json(&field_facets(records, field, limit))
            }
        }
        Commands::Values { field, infra } => {
            if infra {
                let field = lookup_field::<InfraField>(&field)?;
                to_json(&distinct_values(store.infra_records(), field))
            } else {
                let field = lookup_field::<OrgField>(&field)?;
                to_json(&distinct_values(store.organizations(), field))
            }
        }
        Commands::Org { id } => to_json(&store.organization(&id)?),
        Commands::Infra { id, limit } => to_json(&infra_profile(
            store,
            &id,
            limit.unwrap_or(limits.infra_top_limit),
        )?),
    }
}

fn export_options(query: &str) -> ExportOptions {
    ExportOptions {
        query: Some(query.to_string()).filter(|q| !q.trim().is_empty()),
        ..ExportOptions::default()
    }
}

/// Org ids passing `filter`, or `None` when no constraint was given.
fn org_subset<'a>(store: &'a RecordStore, filter: &FilterArgs) -> Option<HashSet<&'a str>> {
    if filter.is_empty() {
        return None;
    }
    let req: ListingRequest<OrgField> = ListingRequest::from_params(filter.params(), 1);
    Some(
        filter_organizations(store, &req.filters)
            .into_iter()
            .map(|org| org.org_id.as_str())
            .collect(),
    )
}

fn lookup_field<F: FieldSpec>(name: &str) -> Result<F> {
    F::from_name(name).ok_or_else(|| anyhow!("unknown field '{name}'"))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing output")
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "orgdir", "orgdir")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
