mod flatten;
mod normalize;
mod repository;
mod resolve;
mod tool_list;

pub use flatten::flatten_repo_info;
pub use normalize::{complete_repo_information, format_tool_shed_url};
pub use repository::{
    InstallDefaults, Repository, RepositorySpec, ToolEntry, DEFAULT_TOOL_SHED_URL,
};
pub use resolve::{resolve_changeset_revision, RevisionCatalog};
pub use tool_list::ToolList;
