// Traffic routing type reported by the Ambassador reconciler.
pub const AMBASSADOR_ROUTING_TYPE: &str = "Ambassador";

// API group, version and plural of the Ambassador Mapping resource.
pub const MAPPING_GROUP: &str = "getambassador.io";
pub const MAPPING_VERSION: &str = "v2";
pub const MAPPING_PLURAL: &str = "mappings";

// Suffix appended to the base mapping name to build the canary mapping name.
pub const CANARY_MAPPING_SUFFIX: &str = "-canary";

// Maximum length of a Kubernetes object name.
pub const MAX_RESOURCE_NAME_LEN: usize = 253;

// The Rollout kind the events are recorded against.
pub const ROLLOUT_API_VERSION: &str = "argoproj.io/v1alpha1";
pub const ROLLOUT_KIND: &str = "Rollout";

// Reporter name used when publishing Kubernetes events.
pub const EVENT_REPORTER: &str = "ambassador-canary-controller";

// Event reasons.
pub const AMBASSADOR_MAPPING_NOT_FOUND: &str = "AmbassadorMappingNotFound";
pub const AMBASSADOR_MAPPING_CONFIG_ERROR: &str = "AmbassadorMappingConfigError";
pub const CANARY_MAPPING_CLEANUP_ERROR: &str = "CanaryMappingCleanupError";
pub const CANARY_MAPPING_CREATION_ERROR: &str = "CanaryMappingCreationError";
pub const CANARY_MAPPING_UPDATE_ERROR: &str = "CanaryMappingUpdateError";
pub const CANARY_MAPPING_WEIGHT_UPDATE: &str = "CanaryMappingWeightUpdate";

// Environment variable holding the webhook signing secret.
pub const WEBHOOK_SECRET_ENV_VAR: &str = "AMBASSADOR_WEBHOOK_SECRET";

// Headers carried by the weight change webhook.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Rollout-Signature";
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "X-Rollout-Timestamp";

// Rollout annotations configuring the weight change webhook.
pub const ANNOTATION_TARGET_URL: &str = "getambassador.io/webhookUrl";
pub const ANNOTATION_ROLLOUT_ID: &str = "getambassador.io/rolloutId";
