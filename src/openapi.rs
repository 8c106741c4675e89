use utoipa::OpenApi;

use crate::cards::{DayCard, LeadHandoff, SessionCard, TypeOption, WeekSchedule};
use crate::filters::Filters;
use crate::handlers::{ExplorerResponse, MetaResponse};
use crate::models::{
    Coach, Direction, LevelTag, Location, TrainingMeta, TrainingSession, TrainingType,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::get_meta,
        crate::handlers::create_explorer,
        crate::handlers::get_explorer,
        crate::handlers::next_week,
        crate::handlers::previous_week,
        crate::handlers::go_to_week,
        crate::handlers::update_filters,
        crate::handlers::reset_filters,
        crate::handlers::delete_explorer,
        crate::handlers::get_ical
    ),
    components(schemas(
        ExplorerResponse,
        MetaResponse,
        WeekSchedule,
        DayCard,
        SessionCard,
        LeadHandoff,
        TypeOption,
        Filters,
        TrainingSession,
        TrainingType,
        TrainingMeta,
        Direction,
        Coach,
        Location,
        LevelTag
    )),
    tags(
        (name = "schedule", description = "Weekly training schedule explorer")
    )
)]
pub struct ApiDoc;
