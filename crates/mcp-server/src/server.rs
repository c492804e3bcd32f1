use crate::outcome::run_tool;
use crate::params::{
    DefectIdParams, ListStreamsParams, ListUsersParams, ProjectIdParams, SearchDefectsParams,
    UsernameParams,
};
use crate::roles::UserRoles;
use crate::summary::project_summary;
use coverity_connect_client::model::{DEFAULT_DEFECT_LIMIT, DEFAULT_USER_LIMIT};
use coverity_connect_client::{CoverityApi, CoverityError, DefectQuery, UserQuery};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, GetPromptRequestParams, GetPromptResult, Implementation,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, PaginatedRequestParams,
    ReadResourceRequestParams, ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData, ServerHandler, tool, tool_handler, tool_router};
use std::sync::Arc;

const INSTRUCTIONS: &str = "Read-only access to a Coverity Connect server. Use list_projects and \
list_streams to discover scope, search_defects and get_defect_details to inspect findings, \
get_project_summary for per-stream severity and status counts, and the user tools for account \
and role audits. Failed calls return an error result with a kind; an empty list means the \
server genuinely returned nothing.";

/// MCP server backed by a [`CoverityApi`].
///
/// Cheap to clone; clones share the remote client.
#[derive(Clone)]
pub struct CoverityServer {
    pub(crate) api: Arc<dyn CoverityApi>,
    tool_router: ToolRouter<Self>,
}

impl CoverityServer {
    pub fn new(api: Arc<dyn CoverityApi>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl CoverityServer {
    #[tool(description = "List all projects visible to the configured account")]
    async fn list_projects(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool("list_projects", &context.ct, self.api.list_projects()).await
    }

    #[tool(description = "List analysis streams, optionally restricted to one project (key or name)")]
    async fn list_streams(
        &self,
        Parameters(p): Parameters<ListStreamsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool(
            "list_streams",
            &context.ct,
            self.api.list_streams(p.project_id.as_deref()),
        )
        .await
    }

    #[tool(
        description = "Search defects. Optional filters (checker, severity, status) are passed to the server; limit defaults to 50"
    )]
    async fn search_defects(
        &self,
        Parameters(p): Parameters<SearchDefectsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let mut query = DefectQuery {
            stream_id: p.stream_id,
            query: p.query,
            limit: p.limit.unwrap_or(DEFAULT_DEFECT_LIMIT),
            ..DefectQuery::default()
        };
        for (name, value) in [
            ("checker", p.checker),
            ("severity", p.severity),
            ("status", p.status),
        ] {
            if let Some(v) = value {
                query = query.with_filter(name, v);
            }
        }
        run_tool("search_defects", &context.ct, self.api.search_defects(&query)).await
    }

    #[tool(description = "Get one defect with its event trace; returns null if the CID is unknown")]
    async fn get_defect_details(
        &self,
        Parameters(p): Parameters<DefectIdParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool("get_defect_details", &context.ct, self.api.get_defect(&p.cid)).await
    }

    #[tool(
        description = "List user accounts. Disabled and locked accounts are excluded unless requested; limit defaults to 200"
    )]
    async fn list_users(
        &self,
        Parameters(p): Parameters<ListUsersParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = UserQuery {
            include_disabled: p.include_disabled.unwrap_or(false),
            include_locked: p.include_locked.unwrap_or(false),
            limit: p.limit.unwrap_or(DEFAULT_USER_LIMIT),
        };
        run_tool("list_users", &context.ct, self.api.list_users(&query)).await
    }

    #[tool(description = "Get one user account; returns null if the user does not exist")]
    async fn get_user_details(
        &self,
        Parameters(p): Parameters<UsernameParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool("get_user_details", &context.ct, self.api.get_user(&p.username)).await
    }

    #[tool(
        description = "Describe a user's role assignments, groups and account status; returns null if the user does not exist"
    )]
    async fn get_user_roles(
        &self,
        Parameters(p): Parameters<UsernameParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let work = async {
            let user = self.api.get_user(&p.username).await?;
            Ok::<_, CoverityError>(user.as_ref().map(UserRoles::from))
        };
        run_tool("get_user_roles", &context.ct, work).await
    }

    #[tool(
        description = "Per-stream defect totals with severity (High/Medium/Low) and status breakdowns for one project; returns null if the project is unknown"
    )]
    async fn get_project_summary(
        &self,
        Parameters(p): Parameters<ProjectIdParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool(
            "get_project_summary",
            &context.ct,
            project_summary(self.api.as_ref(), &p.project_id),
        )
        .await
    }

    #[tool(description = "Account totals (active, disabled, administrators) and role distribution")]
    async fn get_user_summary(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        run_tool("get_user_summary", &context.ct, self.api.user_summary()).await
    }
}

#[tool_handler]
impl ServerHandler for CoverityServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.into()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult {
            resources: Vec::new(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(ListResourceTemplatesResult {
            resource_templates: crate::resources::templates(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        tokio::select! {
            () = context.ct.cancelled() => Err(ErrorData::internal_error("request cancelled", None)),
            res = crate::resources::read(self.api.as_ref(), &request.uri) => res,
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        Ok(ListPromptsResult {
            prompts: crate::prompts::list(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        crate::prompts::get(&request.name)
    }
}
