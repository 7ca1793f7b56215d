// Mirrors `CREATE_TABLE_SQL` in the postgres backend.

diesel::table! {
    #[sql_name = "JobStatus"]
    job_status (application_id, job_id, job_status_timestamp, business_date) {
        #[sql_name = "ApplicationId"]
        #[max_length = 200]
        application_id -> Varchar,
        #[sql_name = "JobId"]
        #[max_length = 200]
        job_id -> Varchar,
        #[sql_name = "JobStatusCode"]
        #[max_length = 20]
        job_status_code -> Varchar,
        #[sql_name = "JobStatusTimestamp"]
        job_status_timestamp -> Timestamptz,
        #[sql_name = "BusinessDate"]
        business_date -> Date,
        #[sql_name = "RunId"]
        #[max_length = 50]
        run_id -> Varchar,
        #[sql_name = "HostId"]
        #[max_length = 150]
        host_id -> Varchar,
    }
}
