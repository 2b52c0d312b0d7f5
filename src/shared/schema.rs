diesel::table! {
    organizations (id) {
        id -> Uuid,
        name -> Text,
        code -> Text,
        logo -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    facilities (id) {
        id -> Uuid,
        name -> Text,
        ref_code -> Nullable<Text>,
        city -> Nullable<Text>,
        organization_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    departments (id) {
        id -> Uuid,
        name -> Text,
        facility_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    areas (id) {
        id -> Uuid,
        name -> Text,
        department_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    standards (id) {
        id -> Uuid,
        name -> Text,
        facility_id -> Uuid,
        department_id -> Uuid,
        area_id -> Uuid,
        version -> Int4,
        base_standard_id -> Nullable<Uuid>,
        is_current_version -> Bool,
        is_active -> Bool,
        best_practices -> Array<Text>,
        process_opportunities -> Array<Text>,
        version_notes -> Nullable<Text>,
        created_by -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    uom_entries (id) {
        id -> Uuid,
        uom -> Text,
        description -> Text,
        sam_value -> Float8,
        tags -> Array<Text>,
        standard_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    roles (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    permissions (id) {
        id -> Uuid,
        module -> Text,
        action -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    role_permissions (id) {
        id -> Uuid,
        role_id -> Uuid,
        permission_id -> Uuid,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        employee_id -> Text,
        name -> Text,
        email -> Nullable<Text>,
        department -> Nullable<Text>,
        role_id -> Nullable<Uuid>,
        is_active -> Bool,
        external_source -> Nullable<Text>,
        last_sync_at -> Nullable<Timestamptz>,
        goal_daily -> Int4,
        goal_weekly -> Int4,
        goal_monthly -> Int4,
        goal_quarterly -> Int4,
        goal_yearly -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    observations (id) {
        id -> Uuid,
        user_id -> Uuid,
        standard_id -> Uuid,
        time_observed -> Float8,
        total_sams -> Float8,
        observed_performance -> Float8,
        pump_score -> Float8,
        pace -> Float8,
        utilization -> Float8,
        methods -> Float8,
        comments -> Nullable<Text>,
        best_practices_checked -> Array<Text>,
        process_adherence_checked -> Array<Text>,
        delays -> Jsonb,
        observation_reason -> Text,
        started_at -> Timestamptz,
        ended_at -> Timestamptz,
        is_finalized -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    observation_data (id) {
        id -> Uuid,
        observation_id -> Uuid,
        uom -> Text,
        description -> Text,
        quantity -> Int4,
        sam_value -> Float8,
        total_sams -> Float8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(facilities -> organizations (organization_id));
diesel::joinable!(departments -> facilities (facility_id));
diesel::joinable!(areas -> departments (department_id));
diesel::joinable!(standards -> areas (area_id));
diesel::joinable!(uom_entries -> standards (standard_id));
diesel::joinable!(role_permissions -> roles (role_id));
diesel::joinable!(role_permissions -> permissions (permission_id));
diesel::joinable!(users -> roles (role_id));
diesel::joinable!(observations -> users (user_id));
diesel::joinable!(observations -> standards (standard_id));
diesel::joinable!(observation_data -> observations (observation_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    facilities,
    departments,
    areas,
    standards,
    uom_entries,
    roles,
    permissions,
    role_permissions,
    users,
    observations,
    observation_data,
);
