//! Esquema Diesel (escrito a mano, equivalente a `diesel print-schema`).

diesel::table! {
    components (name) {
        name -> Text,
        description -> Text,
        owner -> Text,
    }
}

diesel::table! {
    tags (name) {
        name -> Text,
    }
}

diesel::table! {
    component_tags (component_name, tag_name) {
        component_name -> Text,
        tag_name -> Text,
    }
}

diesel::table! {
    io_pointers (id) {
        id -> BigInt,
        name -> Text,
        pointer_type -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    component_runs (id) {
        id -> BigInt,
        component_name -> Text,
        status -> Text,
        start_time -> Timestamptz,
        end_time -> Nullable<Timestamptz>,
        notes -> Text,
    }
}

diesel::table! {
    component_run_input_association (component_run_id, io_pointer_id) {
        component_run_id -> BigInt,
        io_pointer_id -> BigInt,
    }
}

diesel::table! {
    component_run_output_association (component_run_id, io_pointer_id) {
        component_run_id -> BigInt,
        io_pointer_id -> BigInt,
    }
}

diesel::table! {
    component_run_dependencies (component_run_id, depends_on_run_id) {
        component_run_id -> BigInt,
        depends_on_run_id -> BigInt,
    }
}

diesel::table! {
    labels (id) {
        id -> Text,
    }
}

diesel::table! {
    io_pointer_labels (io_pointer_id, label_id) {
        io_pointer_id -> BigInt,
        label_id -> Text,
    }
}

diesel::table! {
    deleted_labels (id) {
        id -> BigInt,
        label_id -> Text,
        io_pointer_id -> BigInt,
        deleted_at -> Timestamptz,
    }
}

diesel::joinable!(component_tags -> components (component_name));
diesel::joinable!(component_tags -> tags (tag_name));
diesel::joinable!(component_runs -> components (component_name));
diesel::joinable!(component_run_input_association -> component_runs (component_run_id));
diesel::joinable!(component_run_input_association -> io_pointers (io_pointer_id));
diesel::joinable!(component_run_output_association -> component_runs (component_run_id));
diesel::joinable!(component_run_output_association -> io_pointers (io_pointer_id));
diesel::joinable!(io_pointer_labels -> io_pointers (io_pointer_id));
diesel::joinable!(io_pointer_labels -> labels (label_id));
diesel::joinable!(deleted_labels -> io_pointers (io_pointer_id));
diesel::joinable!(deleted_labels -> labels (label_id));

diesel::allow_tables_to_appear_in_same_query!(
    components,
    tags,
    component_tags,
    io_pointers,
    component_runs,
    component_run_input_association,
    component_run_output_association,
    component_run_dependencies,
    labels,
    io_pointer_labels,
    deleted_labels,
);
